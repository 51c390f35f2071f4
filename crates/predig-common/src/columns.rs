//! Canonical column vocabulary.
//!
//! Every adapter renames its tool's native column names into this vocabulary
//! before the Fusion Engine sees them. Downstream code never handles tool
//! specific names.

pub const EPITOPE: &str = "epitope";
pub const HLA_ALLELE: &str = "hla_allele";
/// Synthetic join key: `<allele>_<epitope>`.
pub const ID: &str = "id";

pub const NETCLEAVE: &str = "netcleave";
pub const TAP: &str = "TAP";
pub const NOAH: &str = "NOAH";

pub const MHCFLURRY_AFFINITY: &str = "mhcflurry_affinity";
pub const MHCFLURRY_AFFINITY_PERCENTILE: &str = "mhcflurry_affinity_percentile";
pub const MHCFLURRY_PROCESSING_SCORE: &str = "mhcflurry_processing_score";
pub const MHCFLURRY_PRESENTATION_SCORE: &str = "mhcflurry_presentation_score";

/// Physicochemical descriptors emitted by the hydrolysis predictor.
pub const PCH_COLUMNS: [&str; 7] = [
    "mw_peptide",
    "mw_tcr_contact",
    "hydroph_peptide",
    "hydroph_tcr_contact",
    "charge_peptide",
    "charge_tcr_contact",
    "stab_peptide",
];

/// Final classifier score column.
pub const PREDIG: &str = "predig";

/// Compose the synthetic pair key.
pub fn pair_id(allele: &str, epitope: &str) -> String {
    format!("{}_{}", allele, epitope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_id_format() {
        assert_eq!(pair_id("HLA-A*02:01", "SIINFEKL"), "HLA-A*02:01_SIINFEKL");
    }
}
