//! Neoantigen / class-I affinity predictor (NOAH).
//!
//! NOAH takes a `peptide,HLA` CSV plus a pickled model and writes a
//! tab-delimited headerless table `(allele, peptide, score)`.

use crate::adapter::{require_columns, run_tool, scoped_tempfile, PredictorAdapter, ScratchFile};
use async_trait::async_trait;
use predig_common::batch::Batch;
use predig_common::columns::{pair_id, EPITOPE, HLA_ALLELE, ID, NOAH};
use predig_common::error::{PredigError, Result};
use predig_common::frame::Frame;
use predig_common::predictor::{JoinKey, PredictorResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct NoahAdapter {
    pub python: PathBuf,
    pub script: PathBuf,
    pub model: PathBuf,
    pub timeout: Duration,
}

impl NoahAdapter {
    /// Parse NOAH's headerless output into the canonical schema.
    fn parse_output(&self, path: &Path) -> Result<Frame> {
        if !path.exists() {
            return Err(PredigError::tool(
                self.name(),
                format!("expected output file {} was not produced", path.display()),
            ));
        }
        let file = std::fs::File::open(path)?;
        let mut frame =
            Frame::from_headerless_reader(file, b'\t', vec![HLA_ALLELE, EPITOPE, NOAH])
                .map_err(|e| PredigError::tool(self.name(), format!("unparseable output: {}", e)))?;
        require_columns(self.name(), &frame, &[HLA_ALLELE, EPITOPE, NOAH])?;

        let ids: Vec<String> = frame
            .column(HLA_ALLELE)?
            .iter()
            .zip(frame.column(EPITOPE)?)
            .map(|(a, e)| pair_id(a, e))
            .collect();
        frame.add_column(ID, ids)?;
        Ok(frame)
    }
}

#[async_trait]
impl PredictorAdapter for NoahAdapter {
    fn name(&self) -> &'static str {
        "noah"
    }

    async fn run(&self, batch: &Batch, workdir: &Path) -> Result<PredictorResult> {
        let mut input = Frame::new(vec!["peptide", "HLA"]);
        for query in &batch.queries {
            let allele = query.allele.clone().unwrap_or_default();
            input.push_row(vec![query.epitope.clone(), allele])?;
        }

        let input_file = scoped_tempfile(workdir, ".predig_noah_", ".csv")?;
        input.to_csv_path(input_file.path())?;

        // Tie the output name to the randomized input name so concurrent
        // invocations cannot collide.
        let stem = input_file
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_path = workdir.join(format!("{}_out.tsv", stem));
        let _output_guard = ScratchFile(output_path.clone());

        let args: Vec<OsString> = vec![
            self.script.clone().into(),
            "-i".into(),
            input_file.path().into(),
            "-m".into(),
            self.model.clone().into(),
            "-o".into(),
            output_path.clone().into(),
        ];
        run_tool(self.name(), &self.python, &args, workdir, self.timeout).await?;

        let frame = self.parse_output(&output_path)?;
        Ok(PredictorResult::new(
            self.name(),
            JoinKey::EpitopeAllele,
            frame,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn adapter() -> NoahAdapter {
        NoahAdapter {
            python: PathBuf::from("python"),
            script: PathBuf::from("main_NOAH.py"),
            model: PathBuf::from("model.pkl"),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_parse_headerless_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "HLA-A*02:01\tSIINFEKL\t-1.3").unwrap();
        writeln!(f, "HLA-B*07:02\tGILGFVFTL\t0.4").unwrap();

        let frame = adapter().parse_output(&path).unwrap();
        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.cell(0, ID), Some("HLA-A*02:01_SIINFEKL"));
        assert_eq!(frame.cell(1, NOAH), Some("0.4"));
    }

    #[test]
    fn test_missing_output_is_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = adapter()
            .parse_output(&dir.path().join("absent.tsv"))
            .unwrap_err();
        match err {
            PredigError::ExternalToolFailure { predictor, .. } => assert_eq!(predictor, "noah"),
            other => panic!("expected ExternalToolFailure, got {other}"),
        }
    }
}
