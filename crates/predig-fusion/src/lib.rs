//! predig-fusion — Fusion Engine.
//!
//! Joins the predictors' canonical result tables into one feature row per
//! surviving (epitope, allele) pair, using a tiered key strategy:
//!
//!   1. pair-keyed results (affinity, noah) merge on the synthetic
//!      `id = allele + "_" + epitope`, inner, first result fixes row order
//!   2. epitope-only results (hydrolysis, cleavage, transport) fold into an
//!      accumulator on `epitope`, inner, then attach onto the pair table
//!      through its `epitope` column
//!
//! Inner joins are deliberate: a pair unscored by any one predictor cannot
//! be fed to the classifier, so it is dropped. Column-name collisions keep
//! the first-joined table's bare name and suffix later ones with the
//! predictor name. Duplicate keys collapse to the first occurrence.

use predig_common::columns::{EPITOPE, HLA_ALLELE, ID};
use predig_common::error::{PredigError, Result};
use predig_common::frame::Frame;
use predig_common::predictor::{JoinKey, PredictorResult};
use tracing::{debug, warn};

/// Fuse all predictor results into one table keyed by `id`.
///
/// Raises `JoinKeyMismatch` if the joins leave zero rows; an empty fusion
/// is never a silent success.
pub fn fuse(results: &[PredictorResult]) -> Result<Frame> {
    if results.is_empty() {
        return Err(PredigError::JoinKeyMismatch(
            "no predictor results to fuse".to_string(),
        ));
    }

    let (pair_keyed, epitope_keyed): (Vec<&PredictorResult>, Vec<&PredictorResult>) = results
        .iter()
        .partition(|r| r.key == JoinKey::EpitopeAllele);

    for result in results {
        debug!(
            predictor = %result.predictor,
            rows = result.frame.n_rows(),
            key = ?result.key,
            "fusing predictor result"
        );
        if result.frame.is_empty() {
            return Err(PredigError::JoinKeyMismatch(format!(
                "predictor '{}' contributed an empty table",
                result.predictor
            )));
        }
    }

    // Tier 1: pair-keyed tables on `id`. The first fixes the row order.
    let mut pairs = pair_keyed.iter();
    let mut fused = match pairs.next() {
        Some(first) => {
            check_key(first, ID)?;
            dedup_on(&first.frame, ID, &first.predictor)
        }
        None => {
            return Err(PredigError::JoinKeyMismatch(
                "no pair-keyed predictor result; the fused table needs at least one \
                 (epitope, allele) table to define the output pairs"
                    .to_string(),
            ))
        }
    };
    for result in pairs {
        check_key(result, ID)?;
        // The id key already encodes epitope and allele; the right side's
        // copies would only produce suffixed duplicates.
        let mut right = result.frame.clone();
        right.drop_column(EPITOPE);
        right.drop_column(HLA_ALLELE);
        fused = fused.inner_join(&right, ID, &result.predictor)?;
    }

    // Tier 2: epitope-only accumulator, then attach through `epitope`.
    let mut epitope_results = epitope_keyed.iter();
    if let Some(first) = epitope_results.next() {
        check_key(first, EPITOPE)?;
        let mut accumulator = dedup_on(&first.frame, EPITOPE, &first.predictor);
        for result in epitope_results {
            check_key(result, EPITOPE)?;
            accumulator = accumulator.inner_join(&result.frame, EPITOPE, &result.predictor)?;
        }
        fused = fused.inner_join(&accumulator, EPITOPE, "epitope_keyed")?;
    }

    if fused.is_empty() {
        return Err(PredigError::JoinKeyMismatch(
            "no (epitope, allele) pair survived every predictor's table".to_string(),
        ));
    }

    debug!(rows = fused.n_rows(), cols = fused.n_cols(), "fusion complete");
    Ok(fused)
}

fn check_key(result: &PredictorResult, key: &str) -> Result<()> {
    if !result.frame.has_column(key) {
        return Err(PredigError::SchemaMismatch(format!(
            "predictor '{}' result is missing its join key column '{}'",
            result.predictor, key
        )));
    }
    Ok(())
}

/// Collapse duplicate keys to the first occurrence, preserving row order.
fn dedup_on(frame: &Frame, key: &str, predictor: &str) -> Frame {
    let key_idx = frame
        .column_index(key)
        .expect("caller checked the key column");
    let mut seen = std::collections::HashSet::new();
    let mut out = Frame::new(frame.columns().to_vec());
    for row in frame.rows() {
        if seen.insert(row[key_idx].clone()) {
            out.push_row(row.clone()).expect("same arity");
        } else {
            warn!(predictor, key = %row[key_idx], "duplicate pair collapsed, keeping first");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use predig_common::columns::{
        pair_id, HLA_ALLELE, MHCFLURRY_AFFINITY, NETCLEAVE, NOAH, TAP,
    };

    fn frame(columns: Vec<&str>, rows: Vec<Vec<&str>>) -> Frame {
        let mut f = Frame::new(columns);
        for row in rows {
            f.push_row(row.into_iter().map(String::from).collect()).unwrap();
        }
        f
    }

    fn pair_result(predictor: &str, value_col: &str, rows: Vec<(&str, &str, &str)>) -> PredictorResult {
        let mut f = Frame::new(vec![ID, EPITOPE, HLA_ALLELE, value_col]);
        for (epitope, allele, value) in rows {
            f.push_row(vec![
                pair_id(allele, epitope),
                epitope.to_string(),
                allele.to_string(),
                value.to_string(),
            ])
            .unwrap();
        }
        PredictorResult::new(predictor, JoinKey::EpitopeAllele, f)
    }

    fn epitope_result(predictor: &str, value_col: &str, rows: Vec<(&str, &str)>) -> PredictorResult {
        let f = frame(
            vec![EPITOPE, value_col],
            rows.iter().map(|(e, v)| vec![*e, *v]).collect(),
        );
        PredictorResult::new(predictor, JoinKey::Epitope, f)
    }

    fn five_predictor_results() -> Vec<PredictorResult> {
        vec![
            pair_result("affinity", MHCFLURRY_AFFINITY, vec![("SIINFEKL", "HLA-A*02:01", "312.0")]),
            pair_result("noah", NOAH, vec![("SIINFEKL", "HLA-A*02:01", "-1.2")]),
            epitope_result("cleavage", NETCLEAVE, vec![("SIINFEKL", "0.83")]),
            epitope_result("transport", TAP, vec![("SIINFEKL", "-0.51")]),
            epitope_result("hydrolysis", "mw_peptide", vec![("SIINFEKL", "963.1")]),
        ]
    }

    #[test]
    fn test_single_pair_fuses_to_one_record() {
        let fused = fuse(&five_predictor_results()).unwrap();
        assert_eq!(fused.n_rows(), 1);
        assert_eq!(fused.cell(0, ID), Some("HLA-A*02:01_SIINFEKL"));
        for col in [MHCFLURRY_AFFINITY, NOAH, NETCLEAVE, TAP, "mw_peptide"] {
            assert!(fused.has_column(col), "missing fused column {col}");
        }
    }

    #[test]
    fn test_empty_predictor_table_raises_join_mismatch() {
        let mut results = five_predictor_results();
        results[0].frame = Frame::new(vec![ID, EPITOPE, HLA_ALLELE, MHCFLURRY_AFFINITY]);
        let err = fuse(&results).unwrap_err();
        assert!(matches!(err, PredigError::JoinKeyMismatch(_)));
    }

    #[test]
    fn test_disjoint_keys_raise_join_mismatch() {
        let results = vec![
            pair_result("affinity", MHCFLURRY_AFFINITY, vec![("SIINFEKL", "HLA-A*02:01", "312.0")]),
            pair_result("noah", NOAH, vec![("GILGFVFTL", "HLA-A*02:01", "-1.2")]),
        ];
        let err = fuse(&results).unwrap_err();
        assert!(matches!(err, PredigError::JoinKeyMismatch(_)));
    }

    #[test]
    fn test_inner_join_monotonicity() {
        let results = vec![
            pair_result(
                "affinity",
                MHCFLURRY_AFFINITY,
                vec![
                    ("SIINFEKL", "HLA-A*02:01", "312.0"),
                    ("GILGFVFTL", "HLA-A*02:01", "28.0"),
                    ("NLVPMVATV", "HLA-A*02:01", "55.0"),
                ],
            ),
            pair_result(
                "noah",
                NOAH,
                vec![
                    ("SIINFEKL", "HLA-A*02:01", "-1.2"),
                    ("GILGFVFTL", "HLA-A*02:01", "0.3"),
                ],
            ),
            epitope_result("transport", TAP, vec![("SIINFEKL", "-0.51"), ("GILGFVFTL", "0.13")]),
        ];
        let min_rows = results.iter().map(|r| r.frame.n_rows()).min().unwrap();
        let fused = fuse(&results).unwrap();
        assert!(fused.n_rows() <= min_rows);
        assert_eq!(fused.n_rows(), 2);
    }

    #[test]
    fn test_id_unique_after_duplicate_input_pairs() {
        let results = vec![
            pair_result(
                "affinity",
                MHCFLURRY_AFFINITY,
                vec![
                    ("SIINFEKL", "HLA-A*02:01", "312.0"),
                    ("SIINFEKL", "HLA-A*02:01", "999.0"),
                ],
            ),
            pair_result("noah", NOAH, vec![("SIINFEKL", "HLA-A*02:01", "-1.2")]),
        ];
        let fused = fuse(&results).unwrap();
        assert_eq!(fused.n_rows(), 1);
        // First occurrence wins.
        assert_eq!(fused.cell(0, MHCFLURRY_AFFINITY), Some("312.0"));
    }

    #[test]
    fn test_repeated_epitope_on_two_alleles_stays_disambiguated() {
        let results = vec![
            pair_result(
                "affinity",
                MHCFLURRY_AFFINITY,
                vec![
                    ("SIINFEKL", "HLA-A*02:01", "312.0"),
                    ("SIINFEKL", "HLA-B*07:02", "8750.0"),
                ],
            ),
            pair_result(
                "noah",
                NOAH,
                vec![
                    ("SIINFEKL", "HLA-A*02:01", "-1.2"),
                    ("SIINFEKL", "HLA-B*07:02", "2.0"),
                ],
            ),
            epitope_result("transport", TAP, vec![("SIINFEKL", "-0.51")]),
        ];
        let fused = fuse(&results).unwrap();
        assert_eq!(fused.n_rows(), 2);
        assert_eq!(fused.cell(0, ID), Some("HLA-A*02:01_SIINFEKL"));
        assert_eq!(fused.cell(1, ID), Some("HLA-B*07:02_SIINFEKL"));
        // The epitope-keyed TAP score fans out to both pairs.
        assert_eq!(fused.cell(0, TAP), Some("-0.51"));
        assert_eq!(fused.cell(1, TAP), Some("-0.51"));
    }

    #[test]
    fn test_colliding_columns_suffixed_with_predictor() {
        let results = vec![
            pair_result("affinity", "score", vec![("SIINFEKL", "HLA-A*02:01", "1")]),
            pair_result("noah", "score", vec![("SIINFEKL", "HLA-A*02:01", "2")]),
        ];
        let fused = fuse(&results).unwrap();
        assert_eq!(fused.cell(0, "score"), Some("1"));
        assert_eq!(fused.cell(0, "score_noah"), Some("2"));
    }
}
