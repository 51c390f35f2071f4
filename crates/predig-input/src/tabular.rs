//! Tabular submission parsing (PAIR_CSV and PAIR_TEXT).

use crate::synonyms::HeaderMap;
use predig_common::batch::{Batch, ProteinSource, Query, SubmissionMode};
use predig_common::error::{PredigError, Result};
use std::io;
use tracing::debug;

/// Parse a headered CSV of (epitope, allele) pairs into a Batch.
///
/// Field-count consistency is checked over the whole file and every ragged
/// row is named in the error, not just the first.
pub fn parse_pair_csv<R: io::Read>(reader: R) -> Result<Batch> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let header: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut records: Vec<Vec<String>> = Vec::new();
    let mut ragged: Vec<usize> = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        if row.len() != header.len() {
            ragged.push(i + 2); // 1-based, counting the header line
        }
        records.push(row);
    }
    if !ragged.is_empty() {
        return Err(PredigError::InputValidation(format!(
            "row(s) with a field count different from the header ({} field(s)): lines {}",
            header.len(),
            ragged
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    build_pairs(&header, records, SubmissionMode::PairCsv)
}

/// Parse free-text pairs, one per line, comma- or whitespace-separated.
///
/// The first line may be a synonym header; otherwise fields are positional
/// (epitope, allele).
pub fn parse_pair_text(text: &str) -> Result<Batch> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .peekable();

    let first = *lines.peek().ok_or_else(|| {
        PredigError::InputValidation("the free-text input is empty".to_string())
    })?;

    let first_fields = split_fields(first);
    let has_header = HeaderMap::resolve_paired(&first_fields).is_ok();
    let header = if has_header {
        lines.next();
        first_fields
    } else {
        vec!["epitope".to_string(), "allele".to_string()]
    };

    let mut records: Vec<Vec<String>> = Vec::new();
    let mut ragged: Vec<usize> = Vec::new();
    for (i, line) in lines.enumerate() {
        let fields = split_fields(line);
        if fields.len() != header.len() {
            ragged.push(i + if has_header { 2 } else { 1 });
        }
        records.push(fields);
    }
    if !ragged.is_empty() {
        return Err(PredigError::InputValidation(format!(
            "line(s) with a field count different from {}: {}",
            header.len(),
            ragged
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    build_pairs(&header, records, SubmissionMode::PairText)
}

fn split_fields(line: &str) -> Vec<String> {
    if line.contains(',') {
        line.split(',').map(|f| f.trim().to_string()).collect()
    } else {
        line.split_whitespace().map(str::to_string).collect()
    }
}

fn build_pairs(header: &[String], records: Vec<Vec<String>>, mode: SubmissionMode) -> Result<Batch> {
    let map = HeaderMap::resolve_paired(header)?;
    let allele_idx = map.allele.expect("resolve_paired guarantees an allele column");

    let queries: Vec<Query> = records
        .into_iter()
        .map(|row| {
            let protein = if let Some(i) = map.uniprot_id {
                ProteinSource::UniprotId(row[i].clone())
            } else if let (Some(n), Some(s)) = (map.protein_name, map.protein_seq) {
                ProteinSource::Sequence {
                    name: row[n].clone(),
                    seq: row[s].clone(),
                }
            } else {
                ProteinSource::None
            };
            Query {
                epitope: row[map.epitope].clone(),
                allele: Some(row[allele_idx].clone()).filter(|a| !a.is_empty()),
                protein,
            }
        })
        .collect();

    debug!(rows = queries.len(), ?mode, "normalized tabular input");
    Batch::new(mode, queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use predig_common::batch::MAX_TABULAR_ROWS;

    #[test]
    fn test_synonym_header_round_trip() {
        let synonym = "peptide,HLA\nSIINFEKL,HLA-A*02:01\nGILGFVFTL,HLA-B*07:02\n";
        let canonical = "epitope,allele\nSIINFEKL,HLA-A*02:01\nGILGFVFTL,HLA-B*07:02\n";
        let a = parse_pair_csv(synonym.as_bytes()).unwrap();
        let b = parse_pair_csv(canonical.as_bytes()).unwrap();
        assert_eq!(a.queries, b.queries);
    }

    #[test]
    fn test_csv_without_recognized_columns() {
        let err = parse_pair_csv("seq,mhc\nSIINFEKL,HLA-A*02:01\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PredigError::SchemaMismatch(_)));
    }

    #[test]
    fn test_ragged_rows_all_enumerated() {
        let csv = "peptide,allele\nSIINFEKL\nGILGFVFTL,HLA-A*02:01\nNLVPMVATV\n";
        let err = parse_pair_csv(csv.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("2"));
        assert!(msg.contains("4"));
    }

    #[test]
    fn test_size_ceiling_boundary() {
        let mut at_limit = String::from("peptide,allele\n");
        for i in 0..MAX_TABULAR_ROWS {
            at_limit.push_str(&format!("PEP{},HLA-A*02:01\n", i));
        }
        assert!(parse_pair_csv(at_limit.as_bytes()).is_ok());

        let over = format!("{}EXTRA,HLA-A*02:01\n", at_limit);
        let err = parse_pair_csv(over.as_bytes()).unwrap_err();
        assert!(matches!(err, PredigError::InputValidation(_)));
    }

    #[test]
    fn test_free_text_without_header() {
        let batch = parse_pair_text("SIINFEKL HLA-A*02:01\nGILGFVFTL,HLA-B*07:02\n").unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.queries[0].epitope, "SIINFEKL");
        assert_eq!(batch.queries[1].allele.as_deref(), Some("HLA-B*07:02"));
    }

    #[test]
    fn test_free_text_with_header() {
        let batch = parse_pair_text("peptide hla_allele\nSIINFEKL HLA-A*02:01\n").unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.queries[0].allele.as_deref(), Some("HLA-A*02:01"));
    }

    #[test]
    fn test_uniprot_column_carried() {
        let batch =
            parse_pair_csv("epitope,allele,uniprot_id\nSIINFEKL,HLA-A*02:01,P01234\n".as_bytes())
                .unwrap();
        assert_eq!(
            batch.queries[0].protein,
            ProteinSource::UniprotId("P01234".to_string())
        );
    }
}
