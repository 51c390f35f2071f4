//! The uniform result contract every predictor adapter produces.

use crate::frame::Frame;
use serde::{Deserialize, Serialize};

/// How a predictor's output table is keyed.
///
/// Epitope-only predictors score a peptide independently of the presenting
/// allele; pair-keyed predictors score the (epitope, allele) combination and
/// carry the synthetic `id` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKey {
    Epitope,
    EpitopeAllele,
}

/// Output of one adapter invocation. Produced once, consumed read-only by
/// the Fusion Engine.
#[derive(Debug, Clone)]
pub struct PredictorResult {
    pub predictor: String,
    pub key: JoinKey,
    pub frame: Frame,
}

impl PredictorResult {
    pub fn new(predictor: &str, key: JoinKey, frame: Frame) -> Self {
        Self {
            predictor: predictor.to_string(),
            key,
            frame,
        }
    }
}
