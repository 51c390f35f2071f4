//! predig-adapters — One adapter per external predictor.
//!
//! Each adapter wraps one external tool behind the uniform
//! `run(&Batch, workdir) -> PredictorResult` contract:
//!   1. project the batch to the columns the tool needs
//!   2. serialize into an adapter-prefixed temp file inside the run workdir
//!   3. invoke the tool as a subprocess built from an argument vector
//!   4. parse the native output into the canonical schema
//!   5. remove every working file, success or failure
//!
//! Adapters are mutually independent; none consumes another's output.

pub mod adapter;
pub mod affinity;
pub mod cleavage;
pub mod hydrolysis;
pub mod neoantigen;
pub mod transport;

pub use adapter::PredictorAdapter;
pub use affinity::AffinityAdapter;
pub use cleavage::CleavageAdapter;
pub use hydrolysis::HydrolysisAdapter;
pub use neoantigen::NoahAdapter;
pub use transport::TransportAdapter;
