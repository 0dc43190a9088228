//! Goal-weighted candidate scoring.

use std::cmp::Ordering;

use adforge_models::{
    DetectedProblem, HistoricalOutcome, OptimizationGoal, ProblemType, ScoreBreakdown,
    ScoredStrategy, StrategyCandidate,
};

use crate::frameworks;
use crate::trust::framework_trust;

/// Fixed penalty applied to the generic fallback framework.
pub const FALLBACK_PENALTY: f64 = 0.15;

/// Term weights for one optimization goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalWeights {
    pub impact: f64,
    pub risk: f64,
    pub cost: f64,
    pub trust: f64,
}

impl GoalWeights {
    pub fn for_goal(goal: OptimizationGoal) -> Self {
        match goal {
            OptimizationGoal::Retention => Self {
                impact: 0.5,
                risk: 0.2,
                cost: 0.1,
                trust: 0.2,
            },
            OptimizationGoal::Ctr => Self {
                impact: 0.5,
                risk: 0.25,
                cost: 0.1,
                trust: 0.15,
            },
            OptimizationGoal::Conversions => Self {
                impact: 0.45,
                risk: 0.3,
                cost: 0.1,
                trust: 0.15,
            },
        }
    }
}

/// How much a problem matters for a goal.
pub fn relevance(goal: OptimizationGoal, problem: ProblemType) -> f64 {
    use ProblemType::*;
    match (goal, problem) {
        (OptimizationGoal::Retention, HookWeak | AttentionDrop) => 1.3,
        (OptimizationGoal::Retention, PacingSlow | PacingInconsistent) => 1.2,
        (OptimizationGoal::Ctr, CtaWeak) => 1.4,
        (OptimizationGoal::Ctr, HookWeak) => 1.2,
        (OptimizationGoal::Ctr, BenefitUnclear) => 1.1,
        (OptimizationGoal::Conversions, CtaWeak | ProofMissing) => 1.3,
        (OptimizationGoal::Conversions, BenefitUnclear) => 1.2,
        _ => 1.0,
    }
}

/// Share of the goal-weighted problem severity a candidate addresses.
pub fn impact(
    candidate: &StrategyCandidate,
    problems: &[DetectedProblem],
    goal: OptimizationGoal,
) -> f64 {
    let weighted = |p: &DetectedProblem| p.severity * relevance(goal, p.problem_type);
    let total: f64 = problems.iter().map(weighted).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let solved: f64 = problems
        .iter()
        .filter(|p| candidate.solves_problem(p.problem_type))
        .map(weighted)
        .sum();

    (solved / total * frameworks::spec(candidate.framework).effectiveness).clamp(0.0, 1.0)
}

/// Score one candidate.
pub fn score(
    candidate: StrategyCandidate,
    problems: &[DetectedProblem],
    goal: OptimizationGoal,
    history: &[HistoricalOutcome],
) -> ScoredStrategy {
    let weights = GoalWeights::for_goal(goal);
    let trust = framework_trust(candidate.framework, history);

    let breakdown = ScoreBreakdown {
        impact: impact(&candidate, problems, goal) * weights.impact,
        risk_penalty: candidate.risk * weights.risk,
        cost_penalty: candidate.cost * weights.cost,
        trust_bonus: trust * weights.trust,
        fallback_penalty: if candidate.framework.is_generic_fallback() {
            FALLBACK_PENALTY
        } else {
            0.0
        },
    };

    ScoredStrategy {
        final_score: breakdown.total(),
        candidate,
        breakdown,
        trust,
    }
}

/// Score every candidate and sort best-first. Ties keep framework order.
pub fn rank(
    candidates: Vec<StrategyCandidate>,
    problems: &[DetectedProblem],
    goal: OptimizationGoal,
    history: &[HistoricalOutcome],
) -> Vec<ScoredStrategy> {
    let mut scored: Vec<ScoredStrategy> = candidates
        .into_iter()
        .map(|c| score(c, problems, goal, history))
        .collect();

    scored.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then(a.framework().cmp(&b.framework()))
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use adforge_models::Framework;

    fn candidate(framework: Framework, solves: Vec<ProblemType>, risk: f64) -> StrategyCandidate {
        StrategyCandidate {
            id: format!("{}-1", framework.as_str()),
            framework,
            solves,
            risk,
            cost: 0.2,
            actions: Vec::new(),
        }
    }

    fn problems() -> Vec<DetectedProblem> {
        vec![
            DetectedProblem::new(ProblemType::CtaWeak, 0.7, "cta"),
            DetectedProblem::new(ProblemType::HookWeak, 0.6, "hook"),
        ]
    }

    #[test]
    fn test_goal_changes_impact() {
        let c = candidate(Framework::DirectResponse, vec![ProblemType::CtaWeak], 0.2);
        let ctr = impact(&c, &problems(), OptimizationGoal::Ctr);
        let retention = impact(&c, &problems(), OptimizationGoal::Retention);
        assert!(ctr > retention);
    }

    #[test]
    fn test_fallback_penalty_applied() {
        let scored = score(
            candidate(Framework::GenericPolish, vec![ProblemType::CtaWeak], 0.1),
            &problems(),
            OptimizationGoal::Ctr,
            &[],
        );
        assert_eq!(scored.breakdown.fallback_penalty, FALLBACK_PENALTY);
        assert!((scored.final_score - scored.breakdown.total()).abs() < 1e-12);
    }

    #[test]
    fn test_history_raises_score() {
        let c = candidate(Framework::RapidCut, vec![ProblemType::HookWeak], 0.3);
        let history = vec![
            HistoricalOutcome {
                framework: Framework::RapidCut,
                kept: true,
                regenerated: false,
            };
            3
        ];
        let cold = score(c.clone(), &problems(), OptimizationGoal::Retention, &[]);
        let warm = score(c, &problems(), OptimizationGoal::Retention, &history);
        assert!(warm.final_score > cold.final_score);
    }

    #[test]
    fn test_rank_ties_follow_framework_order() {
        let ranked = rank(
            vec![
                candidate(Framework::StoryArc, vec![ProblemType::HookWeak], 0.3),
                candidate(Framework::HookFirst, vec![ProblemType::HookWeak], 0.3),
            ],
            &problems(),
            OptimizationGoal::Ctr,
            &[],
        );
        assert_eq!(ranked[0].framework(), Framework::HookFirst);
    }
}
