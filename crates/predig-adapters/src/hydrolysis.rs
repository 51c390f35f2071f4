//! Hydrolysis / physicochemical predictor (PCH R script).
//!
//! The script takes a one-column `peptide` CSV and writes its output next to
//! the input as `<stem>_pch.csv`, same row order, with the seven
//! physicochemical descriptors.

use crate::adapter::{
    read_output_csv, require_columns, run_tool, scoped_tempfile, PredictorAdapter, ScratchFile,
};
use async_trait::async_trait;
use predig_common::batch::Batch;
use predig_common::columns::{EPITOPE, PCH_COLUMNS};
use predig_common::error::Result;
use predig_common::frame::Frame;
use predig_common::predictor::{JoinKey, PredictorResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct HydrolysisAdapter {
    pub rscript: PathBuf,
    pub script: PathBuf,
    pub seed: u64,
    pub timeout: Duration,
}

impl HydrolysisAdapter {
    /// Output path the R script derives from its input path.
    fn expected_output(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        input.with_file_name(format!("{}_pch.csv", stem))
    }
}

#[async_trait]
impl PredictorAdapter for HydrolysisAdapter {
    fn name(&self) -> &'static str {
        "hydrolysis"
    }

    async fn run(&self, batch: &Batch, workdir: &Path) -> Result<PredictorResult> {
        // Epitope-keyed predictor: one row per unique peptide.
        let mut input = Frame::new(vec!["peptide"]);
        for epitope in batch.unique_epitopes() {
            input.push_row(vec![epitope])?;
        }

        let input_file = scoped_tempfile(workdir, ".predig_pch_", ".csv")?;
        input.to_csv_path(input_file.path())?;
        let output_path = Self::expected_output(input_file.path());
        let _output_guard = ScratchFile(output_path.clone());

        let args: Vec<OsString> = vec![
            self.script.clone().into(),
            "--input".into(),
            input_file.path().into(),
            "--seed".into(),
            self.seed.to_string().into(),
        ];
        run_tool(self.name(), &self.rscript, &args, workdir, self.timeout).await?;

        let mut frame = read_output_csv(self.name(), &output_path)?;
        frame.rename_column("peptide", EPITOPE);
        let mut required = vec![EPITOPE];
        required.extend(PCH_COLUMNS);
        require_columns(self.name(), &frame, &required)?;
        let frame = frame.select(&required)?;

        Ok(PredictorResult::new(self.name(), JoinKey::Epitope, frame))
    }
}
