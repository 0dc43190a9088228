//! Strategy candidates, actions and scoring results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::analysis::SegmentType;
use crate::error::ModelError;
use crate::problem::ProblemType;

/// Remediation framework. The set is fixed; adding one is a compile-time change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    /// Open on the strongest moment and punch in on it
    HookFirst,
    /// Problem-Agitate-Solution ordering
    ProblemAgitateSolution,
    /// Pull proof forward and back the CTA with it
    ProofStack,
    /// Direct-response CTA emphasis
    DirectResponse,
    /// Tight cuts, compressed filler
    RapidCut,
    /// Benefit-led narrative re-sequencing
    StoryArc,
    /// Light, generic polish used as the last resort
    GenericPolish,
}

impl Framework {
    pub const ALL: &'static [Framework] = &[
        Framework::HookFirst,
        Framework::ProblemAgitateSolution,
        Framework::ProofStack,
        Framework::DirectResponse,
        Framework::RapidCut,
        Framework::StoryArc,
        Framework::GenericPolish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::HookFirst => "hook_first",
            Framework::ProblemAgitateSolution => "problem_agitate_solution",
            Framework::ProofStack => "proof_stack",
            Framework::DirectResponse => "direct_response",
            Framework::RapidCut => "rapid_cut",
            Framework::StoryArc => "story_arc",
            Framework::GenericPolish => "generic_polish",
        }
    }

    /// Human-facing name used in explanations.
    pub fn display_name(&self) -> &'static str {
        match self {
            Framework::HookFirst => "Hook-First",
            Framework::ProblemAgitateSolution => "Problem-Agitate-Solution",
            Framework::ProofStack => "Proof Stack",
            Framework::DirectResponse => "Direct Response",
            Framework::RapidCut => "Rapid Cut",
            Framework::StoryArc => "Story Arc",
            Framework::GenericPolish => "Generic Polish",
        }
    }

    /// Whether this is the designated generic fallback framework.
    pub fn is_generic_fallback(&self) -> bool {
        matches!(self, Framework::GenericPolish)
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Framework {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Framework::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s.to_lowercase())
            .ok_or_else(|| ModelError::unknown_variant("framework", s))
    }
}

/// Kind of segment-level change an action requests.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Compress,
    Remove,
    Reorder,
    Emphasize,
    Split,
    Merge,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Compress => "compress",
            ActionKind::Remove => "remove",
            ActionKind::Reorder => "reorder",
            ActionKind::Emphasize => "emphasize",
            ActionKind::Split => "split",
            ActionKind::Merge => "merge",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compress" => Ok(ActionKind::Compress),
            "remove" => Ok(ActionKind::Remove),
            "reorder" => Ok(ActionKind::Reorder),
            "emphasize" => Ok(ActionKind::Emphasize),
            "split" => Ok(ActionKind::Split),
            "merge" => Ok(ActionKind::Merge),
            _ => Err(ModelError::unknown_variant("action", s)),
        }
    }
}

/// Which segment(s) an action applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SegmentTarget {
    /// A single segment by ID
    Id(String),
    /// Every segment of a type
    Type(SegmentType),
}

impl fmt::Display for SegmentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentTarget::Id(id) => write!(f, "segment '{}'", id),
            SegmentTarget::Type(t) => write!(f, "{} segments", t),
        }
    }
}

/// A declarative, segment-level change. Describes what to change, never how to render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StrategyAction {
    pub kind: ActionKind,

    pub target: SegmentTarget,

    /// Kind-specific factor (speed multiplier, output position, split fraction)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,

    /// Why this action exists
    pub intent: String,

    /// External asset key the action needs (e.g. a testimonial card)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

impl StrategyAction {
    pub fn new(kind: ActionKind, target: SegmentTarget, intent: impl Into<String>) -> Self {
        Self {
            kind,
            target,
            factor: None,
            intent: intent.into(),
            asset: None,
        }
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = Some(factor);
        self
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }
}

/// A concrete remediation proposal for one framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StrategyCandidate {
    pub id: String,
    pub framework: Framework,
    /// Problems this candidate claims to solve
    pub solves: Vec<ProblemType>,
    /// Risk of degrading the ad (0-1)
    pub risk: f64,
    /// Relative production cost (0-1)
    pub cost: f64,
    /// Ordered actions
    pub actions: Vec<StrategyAction>,
}

impl StrategyCandidate {
    pub fn solves_problem(&self, problem: ProblemType) -> bool {
        self.solves.contains(&problem)
    }
}

/// Additive breakdown of a strategy's final score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBreakdown {
    pub impact: f64,
    pub risk_penalty: f64,
    pub cost_penalty: f64,
    pub trust_bonus: f64,
    #[serde(default)]
    pub fallback_penalty: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.impact - self.risk_penalty - self.cost_penalty + self.trust_bonus
            - self.fallback_penalty
    }
}

/// A candidate plus its score. Derived per call and never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoredStrategy {
    #[serde(flatten)]
    pub candidate: StrategyCandidate,
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
    /// Historical trust (0-1) used in the breakdown
    pub trust: f64,
}

impl ScoredStrategy {
    pub fn framework(&self) -> Framework {
        self.candidate.framework
    }

    pub fn id(&self) -> &str {
        &self.candidate.id
    }
}

/// What the caller wants the edit to improve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    Retention,
    Ctr,
    Conversions,
}

impl OptimizationGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationGoal::Retention => "retention",
            OptimizationGoal::Ctr => "ctr",
            OptimizationGoal::Conversions => "conversions",
        }
    }
}

impl fmt::Display for OptimizationGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OptimizationGoal {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "retention" => Ok(OptimizationGoal::Retention),
            "ctr" => Ok(OptimizationGoal::Ctr),
            "conversions" | "conversion" => Ok(OptimizationGoal::Conversions),
            _ => Err(ModelError::unknown_variant("optimization goal", s)),
        }
    }
}

/// Caller's appetite for risky edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskTolerance {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Low => "low",
            RiskTolerance::Medium => "medium",
            RiskTolerance::High => "high",
        }
    }

    /// Maximum candidate risk accepted at this tolerance.
    pub fn ceiling(&self) -> f64 {
        match self {
            RiskTolerance::Low => 0.3,
            RiskTolerance::Medium => 0.5,
            RiskTolerance::High => 0.8,
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskTolerance {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskTolerance::Low),
            "medium" => Ok(RiskTolerance::Medium),
            "high" => Ok(RiskTolerance::High),
            _ => Err(ModelError::unknown_variant("risk tolerance", s)),
        }
    }
}

/// One past use of a framework and what the user did with the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HistoricalOutcome {
    pub framework: Framework,
    /// The user kept the generated variant
    pub kept: bool,
    /// The user later regenerated the variant
    #[serde(default)]
    pub regenerated: bool,
}

impl HistoricalOutcome {
    /// A use counts as a success only when kept and never regenerated.
    /// Regeneration takes precedence over the kept flag.
    pub fn is_success(&self) -> bool {
        self.kept && !self.regenerated
    }
}
