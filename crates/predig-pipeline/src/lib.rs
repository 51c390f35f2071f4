//! predig-pipeline — End-to-end scoring pipeline.
//!
//! Orchestrates the full flow for a single scoring run:
//!   1. Normalize the submission into a Batch (all validation up front,
//!      before any external process is spawned)
//!   2. Run the five predictor adapters as concurrent tasks, bounded by a
//!      semaphore, with a join barrier before fusion; the first failure
//!      aborts the siblings and the run
//!   3. Fuse the predictor tables on tiered keys
//!   4. Assemble the feature vector and score it with the selected model
//!   5. Finalize and persist the public output table
//!
//! There is no partial or degraded output: the classifier needs the full
//! feature vector, so any predictor failure is terminal for the run. No
//! invocation is retried; retrying is the caller's decision at whole-run
//! granularity.

pub mod config;

use chrono::{DateTime, Utc};
use predig_adapters::{
    AffinityAdapter, CleavageAdapter, HydrolysisAdapter, NoahAdapter, PredictorAdapter,
    TransportAdapter,
};
use predig_common::batch::{Batch, SubmissionMode};
use predig_common::error::{PredigError, Result};
use predig_common::predictor::PredictorResult;
use predig_input::scan::{expand_scan, ProteinScan};
use predig_input::tabular::{parse_pair_csv, parse_pair_text};
use predig_scorer::{finalize, FinalizeOptions, Model, Scorer};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;

/// Deterministic join order for fusion: the first pair-keyed table fixes
/// the output row order, and colliding columns keep the earlier table's
/// bare name.
const PREDICTOR_ORDER: [&str; 5] = ["affinity", "noah", "cleavage", "transport", "hydrolysis"];

// ── Job ───────────────────────────────────────────────────────────────────

/// Parameters for a single scoring run.
#[derive(Debug, Clone)]
pub struct ScoreJob {
    pub mode: SubmissionMode,
    /// Raw submission text: CSV, free-text pairs, or a FASTA protein.
    pub input: String,
    /// Newline-delimited allele list (protein-scan mode only).
    pub allele_list: Option<String>,
    pub model: Model,
    pub seed: u64,
    pub columns_to_delete: Vec<String>,
    pub output_path: PathBuf,
}

// ── Progress events ────────────────────────────────────────────────────────

/// Progress event emitted during a run (cloneable for broadcast).
#[derive(Debug, Clone, Serialize)]
pub struct PipelineProgress {
    pub run_id: Uuid,
    pub stage: String,
    pub message: String,
}

fn emit(tx: &Option<broadcast::Sender<PipelineProgress>>, run_id: Uuid, stage: &str, message: &str) {
    info!(stage, "{}", message);
    if let Some(tx) = tx {
        let _ = tx.send(PipelineProgress {
            run_id,
            stage: stage.to_string(),
            message: message.to_string(),
        });
    }
}

// ── Result summary ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PredictorRun {
    pub predictor: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub output_path: PathBuf,
    pub rows: usize,
    pub predictors: Vec<PredictorRun>,
    pub duration_ms: u64,
}

// ── Pipeline ───────────────────────────────────────────────────────────────

/// Run the end-to-end scoring pipeline for one job.
#[instrument(skip(job, config, progress_tx), fields(mode = ?job.mode))]
pub async fn run_pipeline(
    job: ScoreJob,
    config: &Config,
    progress_tx: Option<broadcast::Sender<PipelineProgress>>,
) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let t0 = std::time::Instant::now();
    let timeout = Duration::from_secs(config.run.tool_timeout_secs);

    // Fail fast: configuration and input problems are caught before any
    // external process is spawned.
    config.validate()?;

    let workdir = tempfile::Builder::new()
        .prefix("predig_run_")
        .tempdir()
        .map_err(PredigError::Io)?;

    let cleavage = Arc::new(CleavageAdapter {
        python: config.tools.python.clone(),
        script: config.tools.netcleave_script.clone(),
        timeout,
    });
    let mut adapters: Vec<Arc<dyn PredictorAdapter>> = vec![
        Arc::new(HydrolysisAdapter {
            rscript: config.tools.rscript.clone(),
            script: config.tools.pch_script.clone(),
            seed: job.seed,
            timeout,
        }),
        Arc::new(AffinityAdapter {
            executable: config.tools.mhcflurry.clone(),
            timeout,
        }),
        Arc::new(TransportAdapter {
            executable: config.tools.tapmat.clone(),
            matrix: config.tools.tap_matrix.clone(),
            alpha: config.tools.tap_alpha,
            precursor_len: config.tools.tap_precursor_len,
            timeout,
        }),
        Arc::new(NoahAdapter {
            python: config.tools.python.clone(),
            script: config.tools.noah_script.clone(),
            model: config.tools.noah_model.clone(),
            timeout,
        }),
    ];

    emit(&progress_tx, run_id, "normalize", "normalizing submission");
    let mut results: Vec<PredictorResult> = Vec::new();
    let batch: Batch = match job.mode {
        SubmissionMode::PairCsv => {
            let batch = parse_pair_csv(job.input.as_bytes())?;
            adapters.push(cleavage);
            batch
        }
        SubmissionMode::PairText => {
            let batch = parse_pair_text(&job.input)?;
            adapters.push(cleavage);
            batch
        }
        SubmissionMode::ProteinScan => {
            let allele_list = job.allele_list.as_deref().ok_or_else(|| {
                PredigError::InputValidation(
                    "protein-scan mode requires an allele list".to_string(),
                )
            })?;
            let scan = ProteinScan::parse(&job.input, allele_list)?;

            // The cleavage predictor generates the epitope set for the
            // scan, so it runs first, alone.
            emit(&progress_tx, run_id, "scan", "generating epitopes from protein");
            let (cleavage_result, epitopes) = cleavage
                .run_fasta(&scan.protein_name, &scan.protein_seq, workdir.path())
                .await?;
            results.push(cleavage_result);
            expand_scan(&scan, &epitopes)?
        }
    };

    emit(
        &progress_tx,
        run_id,
        "predict",
        &format!("running {} predictors over {} queries", adapters.len(), batch.len()),
    );
    let concurrent = run_adapters(
        adapters,
        batch,
        workdir.path(),
        config.run.max_concurrency,
    )
    .await?;
    results.extend(concurrent);
    results.sort_by_key(|r| {
        PREDICTOR_ORDER
            .iter()
            .position(|p| *p == r.predictor)
            .unwrap_or(usize::MAX)
    });
    let predictors: Vec<PredictorRun> = results
        .iter()
        .map(|r| PredictorRun {
            predictor: r.predictor.clone(),
            rows: r.frame.n_rows(),
        })
        .collect();

    emit(&progress_tx, run_id, "fuse", "fusing predictor tables");
    let fused = predig_fusion::fuse(&results)?;

    emit(
        &progress_tx,
        run_id,
        "score",
        &format!("scoring {} fused pair(s) with {}", fused.n_rows(), job.model.public_name()),
    );
    let scorer = Scorer {
        rscript: config.tools.rscript.clone(),
        script: config.scoring.xgb_script.clone(),
        model_dir: config.scoring.model_dir.clone(),
        model: job.model,
        seed: job.seed,
        timeout,
    };
    let scored = scorer.score(&fused, workdir.path()).await?;

    emit(&progress_tx, run_id, "finalize", "writing output table");
    let options = FinalizeOptions {
        columns_to_delete: job.columns_to_delete.clone(),
    };
    let table = finalize(&scored, &options, &job.output_path, workdir.path())?;

    let summary = RunSummary {
        run_id,
        model: job.model.public_name().to_string(),
        started_at,
        output_path: job.output_path.clone(),
        rows: table.n_rows(),
        predictors,
        duration_ms: t0.elapsed().as_millis() as u64,
    };
    info!(
        rows = summary.rows,
        duration_ms = summary.duration_ms,
        "pipeline run complete"
    );
    Ok(summary)
}

/// Run the adapters as concurrent tasks with a join barrier.
///
/// Concurrency is bounded by a semaphore; the first failure aborts every
/// sibling task (their subprocesses die with them via kill-on-drop) and is
/// returned as the run's error.
pub async fn run_adapters(
    adapters: Vec<Arc<dyn PredictorAdapter>>,
    batch: Batch,
    workdir: &Path,
    max_concurrency: usize,
) -> Result<Vec<PredictorResult>> {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let batch = Arc::new(batch);
    let mut set = JoinSet::new();

    for adapter in adapters {
        let semaphore = semaphore.clone();
        let batch = batch.clone();
        let workdir = workdir.to_path_buf();
        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            adapter.run(&batch, &workdir).await
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(result)) => results.push(result),
            Ok(Err(e)) => {
                warn!(error = %e, "predictor failed, aborting siblings");
                set.abort_all();
                return Err(e);
            }
            Err(e) if e.is_cancelled() => continue,
            Err(e) => {
                set.abort_all();
                return Err(PredigError::Other(anyhow::anyhow!(
                    "predictor task panicked: {e}"
                )));
            }
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use predig_common::batch::Query;
    use predig_common::frame::Frame;
    use predig_common::predictor::JoinKey;

    struct StubAdapter {
        name: &'static str,
        fail: bool,
        delay_ms: u64,
    }

    #[async_trait]
    impl PredictorAdapter for StubAdapter {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, batch: &Batch, _workdir: &Path) -> Result<PredictorResult> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            if self.fail {
                return Err(PredigError::tool(self.name, "stub failure"));
            }
            let mut frame = Frame::new(vec!["epitope", self.name]);
            for query in &batch.queries {
                frame
                    .push_row(vec![query.epitope.clone(), "0.5".to_string()])
                    .unwrap();
            }
            Ok(PredictorResult::new(self.name, JoinKey::Epitope, frame))
        }
    }

    fn batch() -> Batch {
        Batch::new(
            SubmissionMode::PairCsv,
            vec![Query::new("SIINFEKL", Some("HLA-A*02:01".to_string()))],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_all_adapters_join_before_return() {
        let adapters: Vec<Arc<dyn PredictorAdapter>> = vec![
            Arc::new(StubAdapter { name: "a", fail: false, delay_ms: 20 }),
            Arc::new(StubAdapter { name: "b", fail: false, delay_ms: 1 }),
            Arc::new(StubAdapter { name: "c", fail: false, delay_ms: 10 }),
        ];
        let dir = tempfile::tempdir().unwrap();
        let results = run_adapters(adapters, batch(), dir.path(), 2).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_run() {
        let adapters: Vec<Arc<dyn PredictorAdapter>> = vec![
            Arc::new(StubAdapter { name: "slow", fail: false, delay_ms: 5_000 }),
            Arc::new(StubAdapter { name: "bad", fail: true, delay_ms: 1 }),
        ];
        let dir = tempfile::tempdir().unwrap();
        let t0 = std::time::Instant::now();
        let err = run_adapters(adapters, batch(), dir.path(), 2).await.unwrap_err();
        match err {
            PredigError::ExternalToolFailure { predictor, .. } => assert_eq!(predictor, "bad"),
            other => panic!("expected ExternalToolFailure, got {other}"),
        }
        // The slow sibling must not be waited for to completion.
        assert!(t0.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_concurrency_cap_of_one_serializes() {
        let adapters: Vec<Arc<dyn PredictorAdapter>> = vec![
            Arc::new(StubAdapter { name: "a", fail: false, delay_ms: 10 }),
            Arc::new(StubAdapter { name: "b", fail: false, delay_ms: 10 }),
        ];
        let dir = tempfile::tempdir().unwrap();
        let t0 = std::time::Instant::now();
        let results = run_adapters(adapters, batch(), dir.path(), 1).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(t0.elapsed() >= Duration::from_millis(20));
    }
}
