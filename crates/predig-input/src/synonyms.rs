//! Synonym-to-canonical column mapping.
//!
//! The original submission formats accepted several spellings for the two
//! mandatory columns. The mapping is consulted exactly once, at
//! normalization time.

use predig_common::error::{PredigError, Result};

const EPITOPE_SYNONYMS: [&str; 2] = ["peptide", "epitope"];
const ALLELE_SYNONYMS: [&str; 4] = ["allele", "HLA", "HLA_allele", "hla_allele"];

/// Columns carried through unchanged when present.
const PASSTHROUGH: [&str; 3] = ["uniprot_id", "protein_name", "protein_seq"];

/// Canonical name for a header field, or None for columns we ignore.
pub fn canonical_name(header: &str) -> Option<&'static str> {
    if EPITOPE_SYNONYMS.contains(&header) {
        return Some("epitope");
    }
    if ALLELE_SYNONYMS.contains(&header) {
        return Some("allele");
    }
    PASSTHROUGH.iter().find(|p| **p == header).copied()
}

/// Resolved positions of the canonical columns within a header.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    pub epitope: usize,
    pub allele: Option<usize>,
    pub uniprot_id: Option<usize>,
    pub protein_name: Option<usize>,
    pub protein_seq: Option<usize>,
}

impl HeaderMap {
    /// Resolve a raw header. The epitope column is mandatory; whether the
    /// allele column is depends on the submission mode, so the caller
    /// decides what a missing allele means.
    pub fn resolve(header: &[String]) -> Result<Self> {
        let find = |canonical: &str| {
            header
                .iter()
                .position(|h| canonical_name(h.trim()) == Some(canonical))
        };

        let epitope = find("epitope").ok_or_else(|| {
            PredigError::SchemaMismatch(format!(
                "no epitope column found; accepted names: {} (header was: {})",
                EPITOPE_SYNONYMS.join(", "),
                header.join(", ")
            ))
        })?;

        Ok(Self {
            epitope,
            allele: find("allele"),
            uniprot_id: find("uniprot_id"),
            protein_name: find("protein_name"),
            protein_seq: find("protein_seq"),
        })
    }

    /// As `resolve`, but the allele column is mandatory too.
    pub fn resolve_paired(header: &[String]) -> Result<Self> {
        let map = Self::resolve(header)?;
        if map.allele.is_none() {
            return Err(PredigError::SchemaMismatch(format!(
                "no allele column found; accepted names: {} (header was: {})",
                ALLELE_SYNONYMS.join(", "),
                header.join(", ")
            )));
        }
        Ok(map)
    }
}
