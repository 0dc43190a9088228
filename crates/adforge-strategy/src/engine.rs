//! Decision entry point.

use std::collections::BTreeSet;

use adforge_models::{
    ActionKind, AnalyzedVideo, DetectedProblem, Framework, HistoricalOutcome, OptimizationGoal,
    RiskTolerance, ScoredStrategy,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::candidates;
use crate::detector::{self, Detection};
use crate::explain;
use crate::scorer;
use crate::selector::{self, RejectionReason, SelectionConfig};

pub const DEFAULT_MAX_STRATEGIES: usize = 3;

/// Caller-controlled decision inputs besides the analysis itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub goal: OptimizationGoal,
    #[serde(default)]
    pub risk_tolerance: RiskTolerance,
    #[serde(default)]
    pub forbidden_actions: BTreeSet<ActionKind>,
    #[serde(default)]
    pub history: Vec<HistoricalOutcome>,
    #[serde(default)]
    pub previous_framework: Option<Framework>,
    #[serde(default = "default_max_strategies")]
    pub max_strategies: usize,
}

fn default_max_strategies() -> usize {
    DEFAULT_MAX_STRATEGIES
}

impl DecisionRequest {
    pub fn new(goal: OptimizationGoal) -> Self {
        Self {
            goal,
            risk_tolerance: RiskTolerance::default(),
            forbidden_actions: BTreeSet::new(),
            history: Vec::new(),
            previous_framework: None,
            max_strategies: DEFAULT_MAX_STRATEGIES,
        }
    }

    pub fn with_risk_tolerance(mut self, tolerance: RiskTolerance) -> Self {
        self.risk_tolerance = tolerance;
        self
    }

    pub fn forbid(mut self, kind: ActionKind) -> Self {
        self.forbidden_actions.insert(kind);
        self
    }

    pub fn with_history(mut self, history: Vec<HistoricalOutcome>) -> Self {
        self.history = history;
        self
    }

    pub fn with_previous_framework(mut self, framework: Framework) -> Self {
        self.previous_framework = Some(framework);
        self
    }

    pub fn with_max_strategies(mut self, count: usize) -> Self {
        self.max_strategies = count;
        self
    }
}

/// A selected strategy with its justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStrategy {
    pub rank: usize,
    pub strategy: ScoredStrategy,
    pub explanation: String,
}

/// A candidate that was scored but not selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedAlternative {
    pub candidate_id: String,
    pub framework: Framework,
    pub final_score: f64,
    pub reason: RejectionReason,
    pub explanation: String,
}

/// Outcome of a decision. Every variant is a valid answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionOutcome {
    Strategies {
        problems: Vec<DetectedProblem>,
        ranked: Vec<RankedStrategy>,
        rejected: Vec<RejectedAlternative>,
    },
    NoAction {
        reason: String,
        max_severity: f64,
        fallback_suggestion: String,
    },
    SafeOptimizationOnly {
        reason: String,
        problems: Vec<DetectedProblem>,
        fallback_suggestion: String,
    },
}

impl DecisionOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            DecisionOutcome::Strategies { .. } => "STRATEGIES",
            DecisionOutcome::NoAction { .. } => "NO_ACTION",
            DecisionOutcome::SafeOptimizationOnly { .. } => "SAFE_OPTIMIZATION_ONLY",
        }
    }

    /// Selected strategies, best first. Empty for the fallback outcomes.
    pub fn strategies(&self) -> Vec<&ScoredStrategy> {
        match self {
            DecisionOutcome::Strategies { ranked, .. } => {
                ranked.iter().map(|r| &r.strategy).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn fallback_suggestion(&self) -> Option<&str> {
        match self {
            DecisionOutcome::Strategies { .. } => None,
            DecisionOutcome::NoAction {
                fallback_suggestion,
                ..
            }
            | DecisionOutcome::SafeOptimizationOnly {
                fallback_suggestion,
                ..
            } => Some(fallback_suggestion),
        }
    }
}

const NO_ACTION_SUGGESTION: &str =
    "Ship the original cut; re-run analysis after collecting performance data.";
const SAFE_OPTIMIZATION_SUGGESTION: &str =
    "Apply safe, non-structural polish only: loudness normalization, color correction and captions.";

/// Decide which strategies, if any, to apply to an analyzed video.
///
/// Deterministic for identical inputs. Never fails.
pub fn decide(video: &AnalyzedVideo, request: &DecisionRequest) -> DecisionOutcome {
    let problems = match detector::detect(video) {
        Detection::NoAction { max_severity, .. } => {
            info!(
                video_id = %video.video_id,
                max_severity,
                "No problem severe enough to act on"
            );
            return DecisionOutcome::NoAction {
                reason: format!(
                    "Worst problem severity {:.2} is below the action threshold {:.2}",
                    max_severity,
                    detector::NO_ACTION_THRESHOLD
                ),
                max_severity,
                fallback_suggestion: NO_ACTION_SUGGESTION.to_string(),
            };
        }
        Detection::Problems(problems) => problems,
    };

    debug!(
        video_id = %video.video_id,
        problems = ?problems.iter().map(|p| p.problem_type.as_str()).collect::<Vec<_>>(),
        "Detected problems"
    );

    let generated = candidates::generate(video, &problems, &request.forbidden_actions);
    let ranked = scorer::rank(generated, &problems, request.goal, &request.history);
    let selection = selector::select(
        ranked,
        &SelectionConfig {
            risk_ceiling: request.risk_tolerance.ceiling(),
            previous_framework: request.previous_framework,
            max_strategies: request.max_strategies,
        },
    );

    if selection.selected.is_empty() {
        info!(
            video_id = %video.video_id,
            rejected = selection.rejected.len(),
            "No strategy survived selection"
        );
        let reason = if selection.rejected.is_empty() {
            "No framework could build a strategy from the available segments".to_string()
        } else {
            format!(
                "All {} candidate(s) were rejected at {} risk tolerance",
                selection.rejected.len(),
                request.risk_tolerance
            )
        };
        return DecisionOutcome::SafeOptimizationOnly {
            reason,
            problems,
            fallback_suggestion: SAFE_OPTIMIZATION_SUGGESTION.to_string(),
        };
    }

    let top = selection.selected.first();
    let rejected = selection
        .rejected
        .iter()
        .map(|r| RejectedAlternative {
            candidate_id: r.strategy.id().to_string(),
            framework: r.strategy.framework(),
            final_score: r.strategy.final_score,
            reason: r.reason,
            explanation: explain::rejection_line(r, top, request.risk_tolerance),
        })
        .collect();

    let ranked: Vec<RankedStrategy> = selection
        .selected
        .iter()
        .enumerate()
        .map(|(rank, strategy)| RankedStrategy {
            rank: rank + 1,
            explanation: explain::justify(strategy, &problems, rank),
            strategy: strategy.clone(),
        })
        .collect();

    info!(
        video_id = %video.video_id,
        goal = %request.goal,
        selected = ?ranked.iter().map(|r| r.strategy.id()).collect::<Vec<_>>(),
        "Strategies selected"
    );

    DecisionOutcome::Strategies {
        problems,
        ranked,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{healthy_video, weak_video};
    use adforge_models::ProblemType;

    #[test]
    fn test_cta_scenario_yields_safe_cta_fix() {
        let request = DecisionRequest::new(OptimizationGoal::Ctr)
            .with_risk_tolerance(RiskTolerance::Medium);
        let outcome = decide(&weak_video(), &request);

        let strategies = outcome.strategies();
        assert!(!strategies.is_empty());
        assert!(strategies.len() <= 3);
        assert!(strategies.iter().all(|s| s.candidate.risk <= 0.5));
        assert!(strategies
            .iter()
            .any(|s| s.candidate.solves_problem(ProblemType::CtaWeak)));
    }

    #[test]
    fn test_decision_is_deterministic() {
        let request = DecisionRequest::new(OptimizationGoal::Conversions);
        let first = serde_json::to_string(&decide(&weak_video(), &request)).unwrap();
        for _ in 0..5 {
            let again = serde_json::to_string(&decide(&weak_video(), &request)).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_healthy_video_returns_no_action() {
        let outcome = decide(&healthy_video(), &DecisionRequest::new(OptimizationGoal::Retention));
        assert_eq!(outcome.kind(), "NO_ACTION");
        assert!(outcome.fallback_suggestion().is_some());
    }

    #[test]
    fn test_all_actions_forbidden_is_safe_optimization() {
        let mut request = DecisionRequest::new(OptimizationGoal::Ctr);
        for kind in [
            ActionKind::Compress,
            ActionKind::Remove,
            ActionKind::Reorder,
            ActionKind::Emphasize,
            ActionKind::Split,
            ActionKind::Merge,
        ] {
            request = request.forbid(kind);
        }
        let outcome = decide(&weak_video(), &request);
        assert_eq!(outcome.kind(), "SAFE_OPTIMIZATION_ONLY");
        assert!(!outcome.fallback_suggestion().unwrap().is_empty());
    }

    #[test]
    fn test_rejections_are_explained() {
        let request = DecisionRequest::new(OptimizationGoal::Ctr).with_max_strategies(1);
        match decide(&weak_video(), &request) {
            DecisionOutcome::Strategies {
                ranked, rejected, ..
            } => {
                assert_eq!(ranked.len(), 1);
                assert_eq!(ranked[0].rank, 1);
                assert!(!rejected.is_empty());
                assert!(rejected.iter().all(|r| !r.explanation.is_empty()));
                // Story Arc reorders and sits above the medium ceiling
                assert!(rejected
                    .iter()
                    .any(|r| r.reason == RejectionReason::RiskExceeded));
            }
            other => panic!("expected strategies, got {}", other.kind()),
        }
    }

    #[test]
    fn test_outcome_wire_tag() {
        let outcome = decide(&healthy_video(), &DecisionRequest::new(OptimizationGoal::Ctr));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "NO_ACTION");
    }
}
