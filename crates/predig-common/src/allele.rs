//! HLA allele grammar.
//!
//! The pipeline only accepts 4-digit IMGT class I identifiers of the form
//! `HLA-<gene>*<group>:<protein>` with 1-3 digit groups, e.g. `HLA-A*02:01`.

use crate::error::{PredigError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn allele_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^HLA-[ABC]\*\d{1,3}:\d{1,3}$").expect("allele pattern must compile")
    })
}

/// Check a single allele identifier against the IMGT grammar.
pub fn is_valid_allele(allele: &str) -> bool {
    allele_pattern().is_match(allele)
}

/// Validate a list of alleles, collecting every offender.
///
/// Non-conforming values are reported together in one error rather than
/// fail-fast, so the caller sees the complete list of problems at once.
pub fn validate_alleles<S: AsRef<str>>(alleles: &[S]) -> Result<()> {
    let invalid: Vec<&str> = alleles
        .iter()
        .map(|a| a.as_ref())
        .filter(|a| !is_valid_allele(a))
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(PredigError::InputValidation(format!(
            "invalid HLA allele(s), expected HLA-<gene>*<group>:<protein> (e.g. HLA-A*02:01): {}",
            invalid.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_allele_accepted() {
        assert!(is_valid_allele("HLA-A*02:01"));
        assert!(is_valid_allele("HLA-B*7:2"));
        assert!(is_valid_allele("HLA-C*107:101"));
    }

    #[test]
    fn test_missing_star_rejected() {
        assert!(!is_valid_allele("HLA-A02:01"));
    }

    #[test]
    fn test_other_shapes_rejected() {
        assert!(!is_valid_allele("HLA-DRB1*01:01"));
        assert!(!is_valid_allele("A*02:01"));
        assert!(!is_valid_allele("HLA-A*02:01:01"));
        assert!(!is_valid_allele("HLA-A*0201"));
    }

    #[test]
    fn test_offenders_all_named() {
        let alleles = vec!["HLA-A*02:01", "HLA-A02:01", "HLA-Z*01:01"];
        let err = validate_alleles(&alleles).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("HLA-A02:01"));
        assert!(msg.contains("HLA-Z*01:01"));
        assert!(!msg.contains("HLA-A*02:01,"));
    }
}
