//! TAP transport-efficiency predictor (tapmat_pred_fsa).
//!
//! The tool is parameterized per fixed peptide length, so the batch is
//! partitioned into length buckets, one FASTA and one invocation per
//! bucket, and the per-bucket tables are concatenated. Output rows arrive
//! on stdout as a `#`-commented plain-text table.

use crate::adapter::{run_tool, scoped_tempfile, PredictorAdapter};
use async_trait::async_trait;
use predig_common::batch::Batch;
use predig_common::columns::{EPITOPE, TAP};
use predig_common::error::{PredigError, Result};
use predig_common::frame::Frame;
use predig_common::predictor::{JoinKey, PredictorResult};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub struct TransportAdapter {
    pub executable: PathBuf,
    pub matrix: PathBuf,
    pub alpha: Option<f64>,
    pub precursor_len: Option<u32>,
    pub timeout: Duration,
}

impl TransportAdapter {
    /// Argument vector for one length bucket. Flags are fixed here, never
    /// interpolated through a shell.
    fn build_args(&self, length: usize, fasta: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-mat".into(), self.matrix.clone().into()];
        if let Some(alpha) = self.alpha {
            args.push("-a".into());
            args.push(alpha.to_string().into());
        }
        args.push("-l".into());
        args.push(length.to_string().into());
        if let Some(pl) = self.precursor_len {
            args.push("-pl".into());
            args.push(pl.to_string().into());
        }
        args.push(fasta.into());
        args
    }

    /// Parse one bucket's stdout into (peptide, score) pairs.
    fn parse_output(stdout: &str) -> Vec<(String, String)> {
        stdout
            .lines()
            .filter(|l| !l.trim_start().starts_with('#'))
            .filter_map(|l| {
                let parts: Vec<&str> = l.split_whitespace().collect();
                if parts.len() >= 3 {
                    Some((parts[1].to_string(), parts[2].to_string()))
                } else {
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl PredictorAdapter for TransportAdapter {
    fn name(&self) -> &'static str {
        "transport"
    }

    async fn run(&self, batch: &Batch, workdir: &Path) -> Result<PredictorResult> {
        // Partition unique epitopes by length; BTreeMap keeps bucket order
        // deterministic across runs.
        let mut buckets: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for epitope in batch.unique_epitopes() {
            buckets.entry(epitope.len()).or_default().push(epitope);
        }

        let mut frame = Frame::new(vec![EPITOPE, TAP]);
        for (length, peptides) in &buckets {
            debug!(predictor = self.name(), length, n = peptides.len(), "running length bucket");

            let mut fasta_file = scoped_tempfile(workdir, ".predig_tapmap_", ".fasta")?;
            for (i, peptide) in peptides.iter().enumerate() {
                writeln!(fasta_file, ">{}", i)?;
                writeln!(fasta_file, "{}", peptide)?;
            }
            fasta_file.flush()?;

            let args = self.build_args(*length, fasta_file.path());
            let output = run_tool(self.name(), &self.executable, &args, workdir, self.timeout).await?;

            for (peptide, score) in Self::parse_output(&output.stdout) {
                frame.push_row(vec![peptide, score])?;
            }
        }

        if frame.is_empty() {
            return Err(PredigError::tool(
                self.name(),
                "no scored peptides in the tool output",
            ));
        }

        Ok(PredictorResult::new(self.name(), JoinKey::Epitope, frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> TransportAdapter {
        TransportAdapter {
            executable: PathBuf::from("tapmat_pred_fsa"),
            matrix: PathBuf::from("/data/tap.logodds.mat"),
            alpha: Some(0.2),
            precursor_len: Some(9),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_build_args_full() {
        let args = adapter().build_args(9, Path::new("in.fasta"));
        let rendered: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            rendered,
            vec!["-mat", "/data/tap.logodds.mat", "-a", "0.2", "-l", "9", "-pl", "9", "in.fasta"]
        );
    }

    #[test]
    fn test_build_args_optional_flags_omitted() {
        let mut a = adapter();
        a.alpha = None;
        a.precursor_len = None;
        let args = a.build_args(8, Path::new("in.fasta"));
        let rendered: Vec<String> = args
            .iter()
            .map(|x| x.to_string_lossy().into_owned())
            .collect();
        assert_eq!(rendered, vec!["-mat", "/data/tap.logodds.mat", "-l", "8", "in.fasta"]);
    }

    #[test]
    fn test_parse_output_skips_comments_and_short_lines() {
        let stdout = "\
# tapmat_pred_fsa 1.1
# peptide predictions
0 SIINFEKL -0.51 extra
1 GILGFVFTL 0.13
garbage
";
        let parsed = TransportAdapter::parse_output(stdout);
        assert_eq!(
            parsed,
            vec![
                ("SIINFEKL".to_string(), "-0.51".to_string()),
                ("GILGFVFTL".to_string(), "0.13".to_string()),
            ]
        );
    }
}
