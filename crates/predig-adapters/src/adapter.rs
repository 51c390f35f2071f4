//! Shared adapter contract and subprocess plumbing.

use async_trait::async_trait;
use predig_common::batch::Batch;
use predig_common::error::{PredigError, Result};
use predig_common::frame::Frame;
use predig_common::predictor::PredictorResult;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Uniform contract for one external predictor.
#[async_trait]
pub trait PredictorAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run the tool over the batch inside the per-run working directory.
    ///
    /// Implementations must only create files inside `workdir`, under an
    /// adapter-scoped prefix, and must remove them before returning.
    async fn run(&self, batch: &Batch, workdir: &Path) -> Result<PredictorResult>;
}

/// Captured subprocess streams, kept for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Invoke one external tool as a blocking subprocess with a bounded
/// argument vector, a working directory, and a timeout.
///
/// A non-zero exit code or a timeout becomes an `ExternalToolFailure`
/// tagged with the predictor's name and the captured stderr.
pub async fn run_tool(
    predictor: &str,
    program: &Path,
    args: &[OsString],
    workdir: &Path,
    timeout: Duration,
) -> Result<ToolOutput> {
    info!(predictor, program = %program.display(), "invoking external tool");
    debug!(predictor, ?args, "tool arguments");

    let output = tokio::time::timeout(
        timeout,
        Command::new(program)
            .args(args)
            .current_dir(workdir)
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| {
        PredigError::tool(
            predictor,
            format!("timed out after {}s", timeout.as_secs()),
        )
    })?
    .map_err(|e| PredigError::tool(predictor, format!("failed to spawn {}: {}", program.display(), e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(PredigError::tool(
            predictor,
            format!("exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    debug!(predictor, "external tool completed");
    Ok(ToolOutput { stdout, stderr })
}

/// Read a tool's output CSV, mapping a missing file to a tool failure.
pub fn read_output_csv(predictor: &str, path: &Path) -> Result<Frame> {
    if !path.exists() {
        return Err(PredigError::tool(
            predictor,
            format!("expected output file {} was not produced", path.display()),
        ));
    }
    Frame::from_csv_path(path)
        .map_err(|e| PredigError::tool(predictor, format!("unparseable output: {}", e)))
}

/// Fail if the tool's parsed output is missing required columns or rows.
pub fn require_columns(predictor: &str, frame: &Frame, required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|c| !frame.has_column(c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(PredigError::tool(
            predictor,
            format!("output is missing required column(s): {}", missing.join(", ")),
        ));
    }
    if frame.is_empty() {
        return Err(PredigError::tool(predictor, "output table is empty"));
    }
    Ok(())
}

/// Removes a working file on drop, success or failure.
pub struct ScratchFile(pub PathBuf);

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.0.exists() {
            let _ = std::fs::remove_file(&self.0);
        }
    }
}

/// Removes a working directory tree on drop.
pub struct ScratchDir(pub PathBuf);

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.0.exists() {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
}

/// Create an adapter-scoped temp file inside the run workdir.
///
/// The random name keeps concurrent invocations from clobbering each
/// other's inputs; the prefix makes leftovers attributable.
pub fn scoped_tempfile(workdir: &Path, prefix: &str, suffix: &str) -> Result<tempfile::NamedTempFile> {
    tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(workdir)
        .map_err(PredigError::Io)
}
