//! Capability-based execution router.
//!
//! This crate provides:
//! - The versioned engine capability registry
//! - Capability extraction from render plans and engine scoring
//! - The plan simplifier used on degradation
//! - The per-job state machine with append-only history
//! - The engine trait with FFmpeg, HTTP and dry-run backends
//! - The router with its bounded degradation ladder, and batch routing

pub mod batch;
pub mod bindings;
pub mod capability;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod router;
pub mod scoring;
pub mod simplify;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::route_batch;
pub use bindings::EngineBindings;
pub use capability::RequiredCapabilities;
pub use config::RouterConfig;
pub use engine::{EngineJob, EngineStatus, OutputReference, RenderEngine};
pub use engines::{DryRunEngine, FfmpegEngine, HttpEngine};
pub use error::{EngineError, RouterError, RouterResult};
pub use registry::{EngineRegistry, REGISTRY_VERSION};
pub use router::{
    validate_output, CompletedRender, PartialSuccessBundle, RouteConstraints, RouteRequest,
    RouteResult, Router, UpstreamArtifacts,
};
pub use scoring::{rank_engines, score_engine, Disqualified, EngineRanking, EngineScore};
pub use simplify::{simplify, SIMPLIFIED_RESOLUTION};
pub use state::{JobStateContext, TransitionRecord};
