//! MHC binding affinity predictor (mhcflurry-predict).

use crate::adapter::{
    read_output_csv, require_columns, run_tool, scoped_tempfile, PredictorAdapter,
};
use async_trait::async_trait;
use predig_common::batch::Batch;
use predig_common::columns::{
    pair_id, EPITOPE, HLA_ALLELE, ID, MHCFLURRY_AFFINITY, MHCFLURRY_AFFINITY_PERCENTILE,
    MHCFLURRY_PRESENTATION_SCORE, MHCFLURRY_PROCESSING_SCORE,
};
use predig_common::error::Result;
use predig_common::frame::Frame;
use predig_common::predictor::{JoinKey, PredictorResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct AffinityAdapter {
    pub executable: PathBuf,
    pub timeout: Duration,
}

const REQUIRED: [&str; 6] = [
    "peptide",
    "allele",
    MHCFLURRY_AFFINITY,
    MHCFLURRY_AFFINITY_PERCENTILE,
    MHCFLURRY_PROCESSING_SCORE,
    MHCFLURRY_PRESENTATION_SCORE,
];

#[async_trait]
impl PredictorAdapter for AffinityAdapter {
    fn name(&self) -> &'static str {
        "affinity"
    }

    async fn run(&self, batch: &Batch, workdir: &Path) -> Result<PredictorResult> {
        let mut input = Frame::new(vec!["peptide", "allele"]);
        for query in &batch.queries {
            let allele = query.allele.clone().unwrap_or_default();
            input.push_row(vec![query.epitope.clone(), allele])?;
        }

        let input_file = scoped_tempfile(workdir, ".predig_mhcflurry_", ".csv")?;
        input.to_csv_path(input_file.path())?;
        let output_file = scoped_tempfile(workdir, ".predig_mhcflurry_out_", ".csv")?;

        let args: Vec<OsString> = vec![
            input_file.path().into(),
            "--out".into(),
            output_file.path().into(),
            "--no-throw".into(),
            "--always-include-best-allele".into(),
            "--no-flanking".into(),
        ];
        run_tool(self.name(), &self.executable, &args, workdir, self.timeout).await?;

        let mut frame = read_output_csv(self.name(), output_file.path())?;
        require_columns(self.name(), &frame, &REQUIRED)?;

        // The presentation percentile never feeds the classifier.
        frame.drop_column("mhcflurry_presentation_percentile");
        frame.rename_column("allele", HLA_ALLELE);
        frame.rename_column("peptide", EPITOPE);

        let ids: Vec<String> = frame
            .column(HLA_ALLELE)?
            .iter()
            .zip(frame.column(EPITOPE)?)
            .map(|(a, e)| pair_id(a, e))
            .collect();
        frame.add_column(ID, ids)?;

        Ok(PredictorResult::new(
            self.name(),
            JoinKey::EpitopeAllele,
            frame,
        ))
    }
}
