//! Configuration loading for PredIG.
//! Reads predig.toml from the current directory or the path in PREDIG_CONFIG.

use predig_common::error::{PredigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Paths to the external predictor executables and their fixed inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_rscript")]
    pub rscript: PathBuf,
    #[serde(default = "default_python")]
    pub python: PathBuf,
    #[serde(default = "default_pch_script")]
    pub pch_script: PathBuf,
    #[serde(default = "default_mhcflurry")]
    pub mhcflurry: PathBuf,
    #[serde(default = "default_netcleave_script")]
    pub netcleave_script: PathBuf,
    #[serde(default = "default_tapmat")]
    pub tapmat: PathBuf,
    #[serde(default = "default_tap_matrix")]
    pub tap_matrix: PathBuf,
    pub tap_alpha: Option<f64>,
    pub tap_precursor_len: Option<u32>,
    #[serde(default = "default_noah_script")]
    pub noah_script: PathBuf,
    #[serde(default = "default_noah_model")]
    pub noah_model: PathBuf,
}

fn default_rscript() -> PathBuf { PathBuf::from("Rscript") }
fn default_python() -> PathBuf { PathBuf::from("python") }
fn default_pch_script() -> PathBuf { PathBuf::from("predig_pch_calc.R") }
fn default_mhcflurry() -> PathBuf { PathBuf::from("mhcflurry-predict") }
fn default_netcleave_script() -> PathBuf { PathBuf::from("NetCleave.py") }
fn default_tapmat() -> PathBuf { PathBuf::from("tapmat_pred_fsa") }
fn default_tap_matrix() -> PathBuf { PathBuf::from("tap.logodds.mat") }
fn default_noah_script() -> PathBuf { PathBuf::from("main_NOAH.py") }
fn default_noah_model() -> PathBuf { PathBuf::from("model.pkl") }

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            rscript: default_rscript(),
            python: default_python(),
            pch_script: default_pch_script(),
            mhcflurry: default_mhcflurry(),
            netcleave_script: default_netcleave_script(),
            tapmat: default_tapmat(),
            tap_matrix: default_tap_matrix(),
            tap_alpha: None,
            tap_precursor_len: None,
            noah_script: default_noah_script(),
            noah_model: default_noah_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_xgb_script")]
    pub xgb_script: PathBuf,
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
}

fn default_xgb_script() -> PathBuf { PathBuf::from("predig_spwindep_calc.R") }
fn default_model_dir() -> PathBuf { PathBuf::from("models") }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            xgb_script: default_xgb_script(),
            model_dir: default_model_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum external predictors running at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

fn default_max_concurrency() -> usize { 5 }
fn default_tool_timeout_secs() -> u64 { 1800 }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

impl Config {
    /// Load from an explicit path, PREDIG_CONFIG, or ./predig.toml, in that
    /// order. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("PREDIG_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("predig.toml"));

        if !candidate.exists() {
            if path.is_some() {
                return Err(PredigError::Config(format!(
                    "config file {} does not exist",
                    candidate.display()
                )));
            }
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&candidate)?;
        toml::from_str(&text)
            .map_err(|e| PredigError::Config(format!("{}: {}", candidate.display(), e)))
    }

    /// Check every configured script and matrix path, reporting all missing
    /// files at once. Bare command names (resolved via PATH) are skipped.
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, &Path); 7] = [
            ("tools.pch_script", &self.tools.pch_script),
            ("tools.netcleave_script", &self.tools.netcleave_script),
            ("tools.tapmat", &self.tools.tapmat),
            ("tools.tap_matrix", &self.tools.tap_matrix),
            ("tools.noah_script", &self.tools.noah_script),
            ("tools.noah_model", &self.tools.noah_model),
            ("scoring.xgb_script", &self.scoring.xgb_script),
        ];

        let missing: Vec<String> = checks
            .iter()
            .filter(|(_, p)| p.components().count() > 1 && !p.exists())
            .map(|(name, p)| format!("{} = {}", name, p.display()))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PredigError::Config(format!(
                "missing external tool file(s): {}",
                missing.join("; ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_bare_commands() {
        let config = Config::default();
        assert_eq!(config.tools.rscript, PathBuf::from("Rscript"));
        assert_eq!(config.run.max_concurrency, 5);
        // Bare names resolve via PATH and are not checked for existence.
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [run]
            max_concurrency = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.run.max_concurrency, 2);
        assert_eq!(config.run.tool_timeout_secs, default_tool_timeout_secs());
        assert_eq!(config.tools.mhcflurry, PathBuf::from("mhcflurry-predict"));
    }

    #[test]
    fn test_validate_reports_every_missing_path() {
        let mut config = Config::default();
        config.tools.pch_script = PathBuf::from("/nonexistent/pch.R");
        config.tools.noah_model = PathBuf::from("/nonexistent/model.pkl");
        let err = config.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("pch.R"));
        assert!(msg.contains("model.pkl"));
    }
}
