//! Feature vector selection and validation.

use predig_common::columns::{
    ID, MHCFLURRY_AFFINITY, MHCFLURRY_AFFINITY_PERCENTILE, MHCFLURRY_PRESENTATION_SCORE,
    MHCFLURRY_PROCESSING_SCORE, NETCLEAVE, NOAH, TAP,
};
use predig_common::error::{PredigError, Result};
use predig_common::frame::Frame;

/// The classifier's input columns, in training order.
///
/// Reordering silently produces wrong scores, so this array is the single
/// source of truth for both assembly and validation.
pub const FEATURE_ORDER: [&str; 14] = [
    NETCLEAVE,
    TAP,
    "mw_peptide",
    "mw_tcr_contact",
    "hydroph_peptide",
    "hydroph_tcr_contact",
    "charge_peptide",
    "charge_tcr_contact",
    "stab_peptide",
    NOAH,
    MHCFLURRY_AFFINITY,
    MHCFLURRY_AFFINITY_PERCENTILE,
    MHCFLURRY_PROCESSING_SCORE,
    MHCFLURRY_PRESENTATION_SCORE,
];

/// Project the fused table onto `id` plus the ordered feature vector,
/// verifying every feature is present and numeric.
pub fn assemble_features(fused: &Frame) -> Result<Frame> {
    let missing: Vec<&str> = std::iter::once(&ID)
        .chain(FEATURE_ORDER.iter())
        .filter(|c| !fused.has_column(c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(PredigError::FeatureSchema(format!(
            "fused table is missing feature column(s): {}",
            missing.join(", ")
        )));
    }

    let mut selected = vec![ID];
    selected.extend(FEATURE_ORDER);
    let features = fused.select(&selected)?;

    for (row_idx, row) in features.rows().iter().enumerate() {
        for (col_idx, name) in features.columns().iter().enumerate().skip(1) {
            if row[col_idx].parse::<f64>().is_err() {
                return Err(PredigError::FeatureSchema(format!(
                    "non-numeric value '{}' in column '{}' (row {})",
                    row[col_idx],
                    name,
                    row_idx + 1
                )));
            }
        }
    }

    Ok(features)
}

/// Verify a features table already has the exact training column order.
pub fn validate_feature_order(features: &Frame) -> Result<()> {
    let expected: Vec<&str> = std::iter::once(ID).chain(FEATURE_ORDER).collect();
    let actual: Vec<&str> = features.columns().iter().map(String::as_str).collect();
    if actual != expected {
        return Err(PredigError::FeatureSchema(format!(
            "feature columns out of order: expected [{}], got [{}]",
            expected.join(", "),
            actual.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use predig_common::columns::{EPITOPE, HLA_ALLELE};

    fn fused_one_row() -> Frame {
        let mut columns = vec![ID, EPITOPE, HLA_ALLELE];
        columns.extend(FEATURE_ORDER);
        let mut frame = Frame::new(columns.clone());
        let row: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| match *c {
                ID => "HLA-A*02:01_SIINFEKL".to_string(),
                EPITOPE => "SIINFEKL".to_string(),
                HLA_ALLELE => "HLA-A*02:01".to_string(),
                _ => format!("{}.5", i),
            })
            .collect();
        frame.push_row(row).unwrap();
        frame
    }

    #[test]
    fn test_assemble_orders_features() {
        let features = assemble_features(&fused_one_row()).unwrap();
        validate_feature_order(&features).unwrap();
        assert_eq!(features.n_rows(), 1);
    }

    #[test]
    fn test_missing_feature_named() {
        let mut fused = fused_one_row();
        fused.drop_column("stab_peptide");
        let err = assemble_features(&fused).unwrap_err();
        assert!(matches!(err, PredigError::FeatureSchema(_)));
        assert!(err.to_string().contains("stab_peptide"));
    }

    #[test]
    fn test_non_numeric_feature_rejected() {
        let mut fused = Frame::new(vec![ID]);
        fused.push_row(vec!["k".to_string()]).unwrap();
        for f in FEATURE_ORDER {
            fused.add_column(f, vec!["1.0".to_string()]).unwrap();
        }
        // Rebuild one feature with a junk cell.
        fused.drop_column(NOAH);
        fused.add_column(NOAH, vec!["n/a".to_string()]).unwrap();
        let err = assemble_features(&fused).unwrap_err();
        assert!(err.to_string().contains("NOAH"));
    }

    #[test]
    fn test_out_of_order_features_rejected() {
        let mut shuffled: Vec<&str> = std::iter::once(ID).chain(FEATURE_ORDER).collect();
        shuffled.swap(1, 2);
        let frame = Frame::new(shuffled);
        let err = validate_feature_order(&frame).unwrap_err();
        assert!(matches!(err, PredigError::FeatureSchema(_)));
    }
}
