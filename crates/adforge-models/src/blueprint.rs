//! Creative blueprint (marketing strategy) input document.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::strategy::OptimizationGoal;

/// Campaign objective declared in the blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Reach and watch time
    Awareness,
    /// Clicks through to a landing page
    Traffic,
    /// Purchases, sign-ups, installs
    Conversions,
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::Awareness => "awareness",
            Objective::Traffic => "traffic",
            Objective::Conversions => "conversions",
        }
    }

    /// Optimization goal used when the caller does not name one explicitly.
    pub fn default_goal(&self) -> OptimizationGoal {
        match self {
            Objective::Awareness => OptimizationGoal::Retention,
            Objective::Traffic => OptimizationGoal::Ctr,
            Objective::Conversions => OptimizationGoal::Conversions,
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Marketing strategy accompanying an analyzed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CreativeBlueprint {
    /// Framework name suggested by the strategist (free text, informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    /// Campaign objective
    pub objective: Objective,

    /// Variation ideas proposed for the ad
    #[validate(length(min = 1))]
    pub variation_ideas: Vec<String>,

    /// Desired output duration (milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1000))]
    pub target_duration_ms: Option<u64>,
}

impl CreativeBlueprint {
    /// Create a blueprint with a single variation idea.
    pub fn new(objective: Objective, idea: impl Into<String>) -> Self {
        Self {
            framework: None,
            objective,
            variation_ideas: vec![idea.into()],
            target_duration_ms: None,
        }
    }
}
