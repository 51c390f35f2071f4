use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredigError {
    #[error("Input validation failed: {0}")]
    InputValidation(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("External tool '{predictor}' failed: {message}")]
    ExternalToolFailure { predictor: String, message: String },

    #[error("Fusion produced no rows: {0}")]
    JoinKeyMismatch(String),

    #[error("Feature schema error: {0}")]
    FeatureSchema(String),

    #[error("Model inference failed: {0}")]
    ModelInference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PredigError {
    /// Build an ExternalToolFailure tagged with the predictor's name.
    pub fn tool(predictor: &str, message: impl Into<String>) -> Self {
        Self::ExternalToolFailure {
            predictor: predictor.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PredigError>;
