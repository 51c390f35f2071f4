//! PredIG — peptide–HLA immunogenicity prediction pipeline.
//! Entry point for the `predig` binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use predig_common::batch::SubmissionMode;
use predig_pipeline::config::Config;
use predig_pipeline::{run_pipeline, ScoreJob};
use predig_scorer::Model;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "predig", version, about = "Multi-predictor immunogenicity scoring")]
struct Cli {
    /// Path to predig.toml (defaults to ./predig.toml or PREDIG_CONFIG).
    #[arg(long, global = true, env = "PREDIG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a batch of peptide–HLA pairs.
    Score {
        /// Submission mode.
        #[arg(long, value_enum)]
        mode: Mode,
        /// Input file: CSV, free-text pairs, or a protein FASTA.
        #[arg(long)]
        input: PathBuf,
        /// Newline-delimited allele list (protein-scan mode only).
        #[arg(long)]
        alleles: Option<PathBuf>,
        /// Pretrained model variant.
        #[arg(long, value_enum, default_value = "neoa")]
        model: ModelArg,
        /// Random seed forwarded to the external scripts.
        #[arg(long, default_value_t = 123)]
        seed: u64,
        /// Comma-separated column names to drop from the output
        /// (case-insensitive; identifier and score columns are kept).
        #[arg(long, value_delimiter = ',')]
        drop_columns: Vec<String>,
        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,
    },
    /// Check the configured external tool paths.
    CheckTools,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    PairCsv,
    PairText,
    ProteinScan,
}

impl From<Mode> for SubmissionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::PairCsv => SubmissionMode::PairCsv,
            Mode::PairText => SubmissionMode::PairText,
            Mode::ProteinScan => SubmissionMode::ProteinScan,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Neoa,
    Noncan,
    Path,
}

impl From<ModelArg> for Model {
    fn from(model: ModelArg) -> Self {
        match model {
            ModelArg::Neoa => Model::NeoA,
            ModelArg::Noncan => Model::NonCan,
            ModelArg::Path => Model::Path,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Score {
            mode,
            input,
            alleles,
            model,
            seed,
            drop_columns,
            output,
        } => {
            let input_text = std::fs::read_to_string(&input)
                .with_context(|| format!("cannot read input file {}", input.display()))?;
            let allele_list = match &alleles {
                Some(path) => Some(
                    std::fs::read_to_string(path)
                        .with_context(|| format!("cannot read allele list {}", path.display()))?,
                ),
                None => None,
            };

            let job = ScoreJob {
                mode: mode.into(),
                input: input_text,
                allele_list,
                model: model.into(),
                seed,
                columns_to_delete: drop_columns,
                output_path: output,
            };
            let summary = run_pipeline(job, &config, None).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::CheckTools => {
            config.validate()?;
            println!("all configured tool paths exist");
        }
    }

    Ok(())
}
