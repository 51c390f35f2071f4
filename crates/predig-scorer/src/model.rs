//! Classifier model selection and invocation.
//!
//! Three pretrained gradient-boosted-tree variants exist, tuned for
//! different peptide contexts. Each is a fixed artifact loaded read-only by
//! the external scoring script; the pipeline never mutates them.

use crate::features::{assemble_features, validate_feature_order};
use predig_common::columns::PREDIG;
use predig_common::error::{PredigError, Result};
use predig_common::frame::Frame;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// The selectable pretrained models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    /// Neoantigen context (default).
    #[default]
    NeoA,
    /// Non-canonical peptides.
    NonCan,
    /// Pathogenic peptides.
    Path,
}

impl Model {
    /// Artifact file name under the configured model directory.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Model::NeoA => "predig_neoa.model",
            Model::NonCan => "predig_noncan.model",
            Model::Path => "predig_path.model",
        }
    }

    pub fn public_name(&self) -> &'static str {
        match self {
            Model::NeoA => "PredIG-NeoA",
            Model::NonCan => "PredIG-NonCan",
            Model::Path => "PredIG-Path",
        }
    }
}

/// Runs the external XGBoost scoring script over an assembled features CSV.
pub struct Scorer {
    pub rscript: PathBuf,
    pub script: PathBuf,
    pub model_dir: PathBuf,
    pub model: Model,
    pub seed: u64,
    pub timeout: Duration,
}

impl Scorer {
    /// Score the fused table: assemble the feature vector, run one batched
    /// forward pass, and append the `predig` column. No other mutation.
    pub async fn score(&self, fused: &Frame, workdir: &Path) -> Result<Frame> {
        let features = assemble_features(fused)?;
        validate_feature_order(&features)?;

        let artifact = self.model_dir.join(self.model.artifact_name());
        if !artifact.exists() {
            return Err(PredigError::ModelInference(format!(
                "model artifact {} not found",
                artifact.display()
            )));
        }

        let input_file = tempfile::Builder::new()
            .prefix(".predig_features_")
            .suffix(".csv")
            .tempfile_in(workdir)?;
        features.to_csv_path(input_file.path())?;
        let output_file = tempfile::Builder::new()
            .prefix(".predig_scored_")
            .suffix(".csv")
            .tempfile_in(workdir)?;

        info!(
            model = self.model.public_name(),
            rows = features.n_rows(),
            "scoring fused table"
        );
        let args: Vec<OsString> = vec![
            self.script.clone().into(),
            "--input".into(),
            input_file.path().into(),
            "--model".into(),
            artifact.into(),
            "--output".into(),
            output_file.path().into(),
            "--seed".into(),
            self.seed.to_string().into(),
        ];

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.rscript)
                .args(&args)
                .current_dir(workdir)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            PredigError::ModelInference(format!("scoring timed out after {}s", self.timeout.as_secs()))
        })?
        .map_err(|e| PredigError::ModelInference(format!("failed to spawn scoring script: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PredigError::ModelInference(format!(
                "scoring script exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let scored = Frame::from_csv_path(output_file.path())
            .map_err(|e| PredigError::ModelInference(format!("unparseable score table: {}", e)))?;
        let scores = self.extract_scores(&scored, features.n_rows())?;

        let mut result = fused.clone();
        result.add_column(PREDIG, scores)?;
        debug!(rows = result.n_rows(), "scoring complete");
        Ok(result)
    }

    /// Pull the `predig` column out of the script's output, checking
    /// cardinality and the [0, 1] probability range.
    fn extract_scores(&self, scored: &Frame, expected_rows: usize) -> Result<Vec<String>> {
        if !scored.has_column(PREDIG) {
            return Err(PredigError::ModelInference(format!(
                "score table is missing the '{}' column",
                PREDIG
            )));
        }
        if scored.n_rows() != expected_rows {
            return Err(PredigError::ModelInference(format!(
                "score table has {} row(s), expected {}",
                scored.n_rows(),
                expected_rows
            )));
        }

        let mut scores = Vec::with_capacity(expected_rows);
        for value in scored.column(PREDIG)? {
            let parsed: f64 = value.parse().map_err(|_| {
                PredigError::ModelInference(format!("non-numeric score '{}'", value))
            })?;
            if !(0.0..=1.0).contains(&parsed) {
                return Err(PredigError::ModelInference(format!(
                    "score {} outside [0, 1]",
                    parsed
                )));
            }
            scores.push(value.to_string());
        }
        Ok(scores)
    }
}
