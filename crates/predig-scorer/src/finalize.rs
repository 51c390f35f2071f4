//! Result Finalizer.
//!
//! Applies the public column order, removes user-requested columns, writes
//! the output artifact, and clears scratch files so a later run in the same
//! directory cannot pick up stale intermediates.

use predig_common::columns::{EPITOPE, HLA_ALLELE, ID, PREDIG};
use predig_common::error::Result;
use predig_common::frame::Frame;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns the deletion list can never remove.
const PROTECTED: [&str; 4] = [ID, EPITOPE, HLA_ALLELE, PREDIG];

#[derive(Debug, Clone, Default)]
pub struct FinalizeOptions {
    /// Case-insensitive column names to drop from the public output.
    pub columns_to_delete: Vec<String>,
}

/// Produce the public output table and persist it.
pub fn finalize(
    scored: &Frame,
    options: &FinalizeOptions,
    output_path: &Path,
    workdir: &Path,
) -> Result<Frame> {
    let mut table = scored.clone();
    table.reorder_front(&[ID, EPITOPE, HLA_ALLELE, PREDIG]);
    apply_deletions(&mut table, &options.columns_to_delete);

    table.to_csv_path(output_path)?;
    info!(
        path = %output_path.display(),
        rows = table.n_rows(),
        cols = table.n_cols(),
        "wrote final result table"
    );

    clear_scratch(workdir);
    Ok(table)
}

/// Drop every column whose case-insensitive name is in the deletion list.
///
/// Identifier and score columns are never removed implicitly; asking for
/// them is logged and ignored. Applying the same list twice is a no-op the
/// second time.
pub fn apply_deletions(table: &mut Frame, columns_to_delete: &[String]) {
    for requested in columns_to_delete {
        let lowered = requested.to_lowercase();
        if PROTECTED.iter().any(|p| p.to_lowercase() == lowered) {
            warn!(column = %requested, "refusing to delete a protected column");
            continue;
        }
        let matches: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| c.to_lowercase() == lowered)
            .cloned()
            .collect();
        for name in matches {
            debug!(column = %name, "deleting column from public output");
            table.drop_column(&name);
        }
    }
}

/// Remove transient `*output*.csv` scratch files from the working
/// directory. Best effort; a missing workdir is not an error.
pub fn clear_scratch(workdir: &Path) {
    let Ok(entries) = std::fs::read_dir(workdir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.contains("output") && name.ends_with(".csv") {
            debug!(file = %name, "clearing scratch file");
            let _ = std::fs::remove_file(entry.path());
        }
    }
}
