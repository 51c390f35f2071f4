//! Protein-scan submission (single FASTA protein + allele list).
//!
//! The epitope set for a scan comes from the cleavage predictor run in FASTA
//! mode, so normalization happens in two steps: `parse_single_fasta` /
//! `parse_allele_list` validate the raw input up front, and `expand_scan`
//! cross-joins the generated epitopes with the allele list once the cleavage
//! adapter has produced them.

use predig_common::allele::validate_alleles;
use predig_common::batch::{Batch, ProteinSource, Query, SubmissionMode, MAX_FASTA_RECORDS};
use predig_common::error::{PredigError, Result};
use tracing::debug;

/// A validated protein-scan request, before epitope generation.
#[derive(Debug, Clone)]
pub struct ProteinScan {
    pub protein_name: String,
    pub protein_seq: String,
    pub alleles: Vec<String>,
}

impl ProteinScan {
    pub fn parse(fasta: &str, allele_list: &str) -> Result<Self> {
        let (protein_name, protein_seq) = parse_single_fasta(fasta)?;
        let alleles = parse_allele_list(allele_list)?;
        Ok(Self {
            protein_name,
            protein_seq,
            alleles,
        })
    }
}

/// Parse a FASTA text expected to hold exactly one protein record.
///
/// The record ceiling guards against a whole-proteome paste; the scan mode
/// is defined for a single protein.
pub fn parse_single_fasta(fasta: &str) -> Result<(String, String)> {
    let records = fasta.lines().filter(|l| l.starts_with('>')).count();
    if records == 0 {
        return Err(PredigError::InputValidation(
            "the FASTA input contains no record header ('>' line)".to_string(),
        ));
    }
    if records > MAX_FASTA_RECORDS {
        return Err(PredigError::InputValidation(format!(
            "the FASTA input contains {} records, the maximum is {}",
            records, MAX_FASTA_RECORDS
        )));
    }

    let mut name = String::new();
    let mut seq = String::new();
    for line in fasta.lines().map(str::trim) {
        if let Some(header) = line.strip_prefix('>') {
            if !seq.is_empty() {
                // Only the first record feeds the scan.
                break;
            }
            name = header
                .split_whitespace()
                .next()
                .unwrap_or("protein")
                .to_string();
        } else if !line.is_empty() {
            seq.push_str(line);
        }
    }

    if seq.is_empty() {
        return Err(PredigError::InputValidation(
            "the FASTA record has no sequence lines".to_string(),
        ));
    }
    Ok((name, seq))
}

/// Parse and validate a newline-delimited allele list.
///
/// Every non-conforming allele is collected and reported in one error.
pub fn parse_allele_list(text: &str) -> Result<Vec<String>> {
    let alleles: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if alleles.is_empty() {
        return Err(PredigError::InputValidation(
            "the allele list is empty".to_string(),
        ));
    }
    validate_alleles(&alleles)?;
    Ok(alleles)
}

/// Cross-join the generated epitope set with every allele of the scan.
pub fn expand_scan(scan: &ProteinScan, epitopes: &[String]) -> Result<Batch> {
    if epitopes.is_empty() {
        return Err(PredigError::InputValidation(
            "the cleavage predictor generated no epitopes for the protein".to_string(),
        ));
    }

    let mut queries = Vec::with_capacity(epitopes.len() * scan.alleles.len());
    for epitope in epitopes {
        for allele in &scan.alleles {
            queries.push(Query {
                epitope: epitope.clone(),
                allele: Some(allele.clone()),
                protein: ProteinSource::Sequence {
                    name: scan.protein_name.clone(),
                    seq: scan.protein_seq.clone(),
                },
            });
        }
    }

    debug!(
        epitopes = epitopes.len(),
        alleles = scan.alleles.len(),
        pairs = queries.len(),
        "expanded protein scan"
    );
    Batch::new(SubmissionMode::ProteinScan, queries)
}
