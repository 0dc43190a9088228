//! Risk-aware, diversity-aware selection over ranked candidates.

use std::collections::BTreeSet;

use adforge_models::{Framework, ScoredStrategy};
use serde::{Deserialize, Serialize};

/// Lead a repeated framework needs over the next distinct framework.
pub const REPEAT_MARGIN: f64 = 0.1;

/// Why a candidate was not selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    RiskExceeded,
    SolvesFewerProblems,
    LowerScore,
    DiversityPreference,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::RiskExceeded => "risk_exceeded",
            RejectionReason::SolvesFewerProblems => "solves_fewer_problems",
            RejectionReason::LowerScore => "lower_score",
            RejectionReason::DiversityPreference => "diversity_preference",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    pub risk_ceiling: f64,
    pub previous_framework: Option<Framework>,
    pub max_strategies: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub strategy: ScoredStrategy,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub selected: Vec<ScoredStrategy>,
    pub rejected: Vec<Rejection>,
}

/// Walk `ranked` best-first and pick up to `max_strategies` candidates.
pub fn select(ranked: Vec<ScoredStrategy>, config: &SelectionConfig) -> Selection {
    let limit = config.max_strategies.max(1);
    let mut selection = Selection::default();
    let mut taken: BTreeSet<Framework> = BTreeSet::new();

    for (index, candidate) in ranked.iter().enumerate() {
        let reason = if candidate.candidate.risk > config.risk_ceiling {
            Some(RejectionReason::RiskExceeded)
        } else if taken.contains(&candidate.framework()) {
            Some(RejectionReason::DiversityPreference)
        } else if config.previous_framework == Some(candidate.framework())
            && !leads_next_distinct(&ranked, index, config.risk_ceiling)
        {
            Some(RejectionReason::DiversityPreference)
        } else if selection.selected.len() >= limit {
            let best_solves = selection.selected[0].candidate.solves.len();
            if candidate.candidate.solves.len() < best_solves {
                Some(RejectionReason::SolvesFewerProblems)
            } else {
                Some(RejectionReason::LowerScore)
            }
        } else {
            None
        };

        match reason {
            Some(reason) => selection.rejected.push(Rejection {
                strategy: candidate.clone(),
                reason,
            }),
            None => {
                taken.insert(candidate.framework());
                selection.selected.push(candidate.clone());
            }
        }
    }

    selection
}

/// Whether `ranked[index]` beats the next eligible candidate of a different
/// framework by more than [`REPEAT_MARGIN`]. With no such rival it does.
fn leads_next_distinct(ranked: &[ScoredStrategy], index: usize, risk_ceiling: f64) -> bool {
    let current = &ranked[index];
    ranked[index + 1..]
        .iter()
        .find(|c| c.framework() != current.framework() && c.candidate.risk <= risk_ceiling)
        .map(|rival| current.final_score - rival.final_score > REPEAT_MARGIN)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adforge_models::{ProblemType, ScoreBreakdown, StrategyCandidate};

    fn scored(framework: Framework, score: f64, risk: f64, solves: usize) -> ScoredStrategy {
        ScoredStrategy {
            candidate: StrategyCandidate {
                id: format!("{}-1", framework.as_str()),
                framework,
                solves: ProblemType::ALL[..solves].to_vec(),
                risk,
                cost: 0.1,
                actions: Vec::new(),
            },
            final_score: score,
            breakdown: ScoreBreakdown::default(),
            trust: 0.5,
        }
    }

    fn config(previous: Option<Framework>, max: usize) -> SelectionConfig {
        SelectionConfig {
            risk_ceiling: 0.5,
            previous_framework: previous,
            max_strategies: max,
        }
    }

    #[test]
    fn test_risk_ceiling_enforced() {
        let ranked = vec![
            scored(Framework::StoryArc, 0.6, 0.6, 2),
            scored(Framework::DirectResponse, 0.4, 0.2, 1),
        ];
        let selection = select(ranked, &config(None, 3));
        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.selected[0].framework(), Framework::DirectResponse);
        assert_eq!(selection.rejected[0].reason, RejectionReason::RiskExceeded);
    }

    #[test]
    fn test_repeat_needs_clear_lead() {
        let ranked = vec![
            scored(Framework::RapidCut, 0.50, 0.3, 2),
            scored(Framework::HookFirst, 0.45, 0.3, 1),
        ];
        let selection = select(ranked.clone(), &config(Some(Framework::RapidCut), 1));
        assert_eq!(selection.selected[0].framework(), Framework::HookFirst);
        assert_eq!(
            selection.rejected[0].reason,
            RejectionReason::DiversityPreference
        );

        let mut ranked = ranked;
        ranked[0].final_score = 0.7;
        let selection = select(ranked, &config(Some(Framework::RapidCut), 1));
        assert_eq!(selection.selected[0].framework(), Framework::RapidCut);
    }

    #[test]
    fn test_count_limit_reasons() {
        let ranked = vec![
            scored(Framework::ProofStack, 0.5, 0.3, 2),
            scored(Framework::DirectResponse, 0.4, 0.2, 1),
            scored(Framework::HookFirst, 0.3, 0.2, 2),
        ];
        let selection = select(ranked, &config(None, 1));
        assert_eq!(selection.selected.len(), 1);
        assert_eq!(
            selection.rejected[0].reason,
            RejectionReason::SolvesFewerProblems
        );
        assert_eq!(selection.rejected[1].reason, RejectionReason::LowerScore);
    }

    #[test]
    fn test_nothing_survives() {
        let ranked = vec![scored(Framework::StoryArc, 0.6, 0.9, 2)];
        assert!(select(ranked, &config(None, 3)).selected.is_empty());
    }
}
