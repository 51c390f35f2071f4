//! Submission entities: queries, batches, and their size ceilings.

use crate::error::{PredigError, Result};
use serde::{Deserialize, Serialize};

/// Maximum rows for the tabular submission modes.
pub const MAX_TABULAR_ROWS: usize = 500;
/// Maximum FASTA records for the protein-scan mode.
pub const MAX_FASTA_RECORDS: usize = 1000;

/// One of the three accepted input shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    PairCsv,
    PairText,
    ProteinScan,
}

/// Where the epitope came from, when a source protein is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProteinSource {
    None,
    UniprotId(String),
    Sequence { name: String, seq: String },
}

/// One row of input. Created at submission parse time and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub epitope: String,
    pub allele: Option<String>,
    pub protein: ProteinSource,
}

impl Query {
    pub fn new(epitope: impl Into<String>, allele: Option<String>) -> Self {
        Self {
            epitope: epitope.into(),
            allele,
            protein: ProteinSource::None,
        }
    }
}

/// An ordered collection of queries sharing one submission mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub mode: SubmissionMode,
    pub queries: Vec<Query>,
}

impl Batch {
    /// Build a batch, enforcing the tabular size ceiling and the
    /// allele-presence invariant.
    ///
    /// For tabular modes every query must carry an allele; for protein-scan
    /// batches the allele list is attached during scan expansion, so the
    /// same invariant holds by construction there too.
    pub fn new(mode: SubmissionMode, queries: Vec<Query>) -> Result<Self> {
        if queries.is_empty() {
            return Err(PredigError::InputValidation(
                "the input contains no queries".to_string(),
            ));
        }
        // Protein-scan batches are bounded upstream by the FASTA record
        // ceiling; their cross-join may legitimately exceed the tabular cap.
        if mode != SubmissionMode::ProteinScan && queries.len() > MAX_TABULAR_ROWS {
            return Err(PredigError::InputValidation(format!(
                "the input contains {} rows, the maximum is {}",
                queries.len(),
                MAX_TABULAR_ROWS
            )));
        }

        let missing: Vec<usize> = queries
            .iter()
            .enumerate()
            .filter(|(_, q)| q.allele.is_none() || q.epitope.is_empty())
            .map(|(i, _)| i + 1)
            .collect();
        if !missing.is_empty() {
            return Err(PredigError::InputValidation(format!(
                "row(s) missing epitope or allele: {}",
                missing
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        Ok(Self { mode, queries })
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Unique epitopes in first-seen order.
    pub fn unique_epitopes(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.queries
            .iter()
            .filter(|q| seen.insert(q.epitope.clone()))
            .map(|q| q.epitope.clone())
            .collect()
    }
}
