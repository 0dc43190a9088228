//! Shared data models for AdForge.
//!
//! This crate provides Serde-serializable types for:
//! - Analyzed video and creative blueprint input documents
//! - Detected problems and strategy candidates
//! - Render plans produced by the compiler
//! - Engine descriptors for the capability registry
//! - Job identifiers, routing states and degradation levels
//! - Boundary validation of the input documents

pub mod analysis;
pub mod blueprint;
pub mod engine;
pub mod error;
pub mod job;
pub mod problem;
pub mod render_plan;
pub mod strategy;
pub mod validation;

// Re-export common types
pub use analysis::{AggregateScores, AnalyzedVideo, AudioMetadata, Segment, SegmentType};
pub use blueprint::{CreativeBlueprint, Objective};
pub use engine::{CapabilityProfile, CostTier, EngineBackend, EngineDescriptor, Feature};
pub use error::{ModelError, ModelResult};
pub use job::{DegradationLevel, JobId, RouteState};
pub use problem::{DetectedProblem, ProblemType};
pub use render_plan::{
    AudioTrack, AudioTrackKind, Container, OutputFormat, Overlay, PlanStatus, RenderPlan,
    Resolution, TimelineEntry, Transition, TransitionKind, Validation, VideoFilter,
};
pub use strategy::{
    ActionKind, Framework, HistoricalOutcome, OptimizationGoal, RiskTolerance, ScoreBreakdown,
    ScoredStrategy, SegmentTarget, StrategyAction, StrategyCandidate,
};
pub use validation::{parse_analyzed_video, parse_blueprint, validate_analyzed_video, validate_blueprint};
