//! AdForge pipeline worker.
//!
//! This crate provides:
//! - The pipeline from analyzed video to routed render
//! - Batch processing with bounded routing concurrency
//! - Input document loading
//! - Structured job logging
//! - Worker configuration from the environment

pub mod config;
pub mod error;
pub mod inputs;
pub mod logging;
pub mod pipeline;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use inputs::{load_analysis, load_blueprint, load_history};
pub use logging::JobLogger;
pub use pipeline::{resolve_goal, CompileFailure, Pipeline, PipelineInput, PipelineOutcome};
