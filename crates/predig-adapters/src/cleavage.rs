//! Proteasomal C-terminal cleavage predictor (NetCleave).
//!
//! NetCleave takes either a CSV of epitopes with their source protein
//! (uniprot accession or recombinant sequence) or a protein FASTA, selected
//! by a numeric mode flag, and writes its result CSV inside a nested
//! `output/` directory that must be cleared afterwards. In FASTA mode the
//! tool also generates the epitope set, which the protein-scan flow uses to
//! build its batch.

use crate::adapter::{
    read_output_csv, require_columns, run_tool, scoped_tempfile, PredictorAdapter, ScratchDir,
};
use async_trait::async_trait;
use predig_common::batch::{Batch, ProteinSource};
use predig_common::columns::{EPITOPE, NETCLEAVE};
use predig_common::error::{PredigError, Result};
use predig_common::frame::Frame;
use predig_common::predictor::{JoinKey, PredictorResult};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// NetCleave `--pred_input` modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CleavageMode {
    Fasta = 1,
    Uniprot = 2,
    Recombinant = 3,
}

pub struct CleavageAdapter {
    pub python: PathBuf,
    pub script: PathBuf,
    pub timeout: Duration,
}

impl CleavageAdapter {
    /// Invoke NetCleave over a prepared input file and parse the nested
    /// output directory.
    async fn invoke(&self, input: &Path, mode: CleavageMode, workdir: &Path) -> Result<Frame> {
        let output_dir = workdir.join("output");
        let _output_guard = ScratchDir(output_dir.clone());

        let args: Vec<OsString> = vec![
            self.script.clone().into(),
            "--predict".into(),
            input.into(),
            "--pred_input".into(),
            (mode as i32).to_string().into(),
        ];
        run_tool(self.name(), &self.python, &args, workdir, self.timeout).await?;

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_path = output_dir.join(format!("{}_NetCleave.csv", stem));

        let mut frame = read_output_csv(self.name(), &output_path)?;
        frame.rename_column("prediction", NETCLEAVE);
        require_columns(self.name(), &frame, &[EPITOPE, NETCLEAVE])?;
        frame.select(&[EPITOPE, NETCLEAVE])
    }

    /// FASTA mode: score a single protein and return both the per-epitope
    /// cleavage scores and the generated epitope set.
    pub async fn run_fasta(
        &self,
        protein_name: &str,
        protein_seq: &str,
        workdir: &Path,
    ) -> Result<(PredictorResult, Vec<String>)> {
        let mut fasta_file = scoped_tempfile(workdir, ".predig_netcleave_", ".fasta")?;
        writeln!(fasta_file, ">{}", protein_name)?;
        writeln!(fasta_file, "{}", protein_seq)?;
        fasta_file.flush()?;

        let frame = self
            .invoke(fasta_file.path(), CleavageMode::Fasta, workdir)
            .await?;
        let epitopes: Vec<String> = frame
            .column(EPITOPE)?
            .iter()
            .map(|e| e.to_string())
            .collect();

        Ok((
            PredictorResult::new(self.name(), JoinKey::Epitope, frame),
            epitopes,
        ))
    }
}

#[async_trait]
impl PredictorAdapter for CleavageAdapter {
    fn name(&self) -> &'static str {
        "cleavage"
    }

    async fn run(&self, batch: &Batch, workdir: &Path) -> Result<PredictorResult> {
        // One row per unique epitope; the protein source decides the mode.
        let mut seen = std::collections::HashSet::new();
        let queries: Vec<_> = batch
            .queries
            .iter()
            .filter(|q| seen.insert(q.epitope.clone()))
            .collect();

        let uses_uniprot = queries
            .iter()
            .all(|q| matches!(q.protein, ProteinSource::UniprotId(_)));
        let uses_sequence = queries
            .iter()
            .all(|q| matches!(q.protein, ProteinSource::Sequence { .. }));

        let (mode, input) = if uses_uniprot {
            let mut input = Frame::new(vec![EPITOPE, "uniprot_id"]);
            for q in &queries {
                let ProteinSource::UniprotId(ref id) = q.protein else {
                    unreachable!()
                };
                input.push_row(vec![q.epitope.clone(), id.clone()])?;
            }
            (CleavageMode::Uniprot, input)
        } else if uses_sequence {
            let mut input = Frame::new(vec![EPITOPE, "protein_name", "protein_seq"]);
            for q in &queries {
                let ProteinSource::Sequence { ref name, ref seq } = q.protein else {
                    unreachable!()
                };
                input.push_row(vec![q.epitope.clone(), name.clone(), seq.clone()])?;
            }
            (CleavageMode::Recombinant, input)
        } else {
            return Err(PredigError::SchemaMismatch(
                "the cleavage predictor requires every row to carry a 'uniprot_id' \
                 or a 'protein_name'/'protein_seq' pair"
                    .to_string(),
            ));
        };

        let input_file = scoped_tempfile(workdir, ".predig_netcleave_", ".csv")?;
        input.to_csv_path(input_file.path())?;

        let frame = self.invoke(input_file.path(), mode, workdir).await?;
        Ok(PredictorResult::new(self.name(), JoinKey::Epitope, frame))
    }
}
