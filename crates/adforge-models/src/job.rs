//! Routing job identifiers, states and degradation levels.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a routing job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a routing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    #[default]
    Pending,
    Routing,
    Executing,
    Validating,
    Degraded,
    Completed,
    PartialSuccess,
}

impl RouteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteState::Pending => "pending",
            RouteState::Routing => "routing",
            RouteState::Executing => "executing",
            RouteState::Validating => "validating",
            RouteState::Degraded => "degraded",
            RouteState::Completed => "completed",
            RouteState::PartialSuccess => "partial_success",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RouteState::Completed | RouteState::PartialSuccess)
    }

    /// Whether the edge `self -> next` is part of the lifecycle.
    pub fn can_transition_to(&self, next: RouteState) -> bool {
        use RouteState::*;
        matches!(
            (self, next),
            (Pending, Routing)
                | (Routing, Executing)
                | (Routing, PartialSuccess)
                | (Executing, Validating)
                | (Executing, Degraded)
                | (Validating, Completed)
                | (Validating, Degraded)
                | (Degraded, Routing)
                | (Degraded, Executing)
                | (Degraded, PartialSuccess)
        )
    }
}

impl fmt::Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rung of the degradation ladder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
    Default,
)]
#[serde(rename_all = "snake_case")]
pub enum DegradationLevel {
    /// L0: plan as compiled on the top-scored engine
    #[default]
    Normal,
    /// L1: retry the same engine once after a transient error
    RetrySame,
    /// L2: reduced-fidelity plan
    Simplify,
    /// L3: exclude attempted engines and re-score
    SwitchEngine,
    /// L4: terminal partial success
    PartialSuccess,
}

impl DegradationLevel {
    pub fn as_u8(&self) -> u8 {
        match self {
            DegradationLevel::Normal => 0,
            DegradationLevel::RetrySame => 1,
            DegradationLevel::Simplify => 2,
            DegradationLevel::SwitchEngine => 3,
            DegradationLevel::PartialSuccess => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DegradationLevel::Normal => "normal",
            DegradationLevel::RetrySame => "retry_same",
            DegradationLevel::Simplify => "simplify",
            DegradationLevel::SwitchEngine => "switch_engine",
            DegradationLevel::PartialSuccess => "partial_success",
        }
    }
}

impl fmt::Display for DegradationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{} {}", self.as_u8(), self.as_str())
    }
}
