//! predig-scorer — Feature Assembler, classifier invocation, and the
//! Result Finalizer.
//!
//! The assembler selects the fixed, ordered numeric feature vector the
//! gradient-boosted classifier was trained with; order is part of the
//! model's contract, so presence and order are validated before inference.
//! Scoring is one batched invocation over a features CSV, not per-row.

pub mod features;
pub mod finalize;
pub mod model;

pub use features::{assemble_features, FEATURE_ORDER};
pub use finalize::{finalize, FinalizeOptions};
pub use model::{Model, Scorer};
