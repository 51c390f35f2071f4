//! predig-common — Shared types, errors, and the column table used across all PredIG crates.

pub mod allele;
pub mod batch;
pub mod columns;
pub mod error;
pub mod frame;
pub mod predictor;

pub use batch::{Batch, ProteinSource, Query, SubmissionMode};
pub use error::{PredigError, Result};
pub use frame::Frame;
pub use predictor::{JoinKey, PredictorResult};
