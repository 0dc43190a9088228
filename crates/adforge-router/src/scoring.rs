//! Engine eligibility and scoring.

use std::collections::BTreeSet;

use adforge_models::{CostTier, EngineDescriptor, Feature};
use serde::{Deserialize, Serialize};

use crate::capability::RequiredCapabilities;
use crate::registry::EngineRegistry;

const CAPABILITY_WEIGHT: f64 = 0.4;
const RELIABILITY_WEIGHT: f64 = 0.4;
const COST_WEIGHT: f64 = 0.2;

/// A compatible engine with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineScore {
    pub engine_id: String,
    pub score: f64,
    pub capability_match: f64,
    pub reliability: f64,
    pub cost_score: f64,
}

/// An engine that was not eligible, with why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disqualified {
    pub engine_id: String,
    pub reasons: Vec<String>,
}

/// Outcome of scoring the registry against one plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineRanking {
    /// Best first, registry order on ties
    pub ranked: Vec<EngineScore>,
    pub disqualified: Vec<Disqualified>,
}

impl EngineRanking {
    pub fn best(&self) -> Option<&EngineScore> {
        self.ranked.first()
    }

    /// One line per disqualified engine.
    pub fn summary(&self) -> String {
        if self.disqualified.is_empty() {
            return "registry has no engines".to_string();
        }
        self.disqualified
            .iter()
            .map(|d| format!("{}: {}", d.engine_id, d.reasons.join("; ")))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Score `engine` regardless of eligibility.
///
/// `capability_match` measures breadth: the share of every feature flag the
/// engine declares, not only the ones a plan needs.
pub fn score_engine(engine: &EngineDescriptor) -> EngineScore {
    let capability_match =
        engine.capabilities.supported_count() as f64 / Feature::ALL.len() as f64;
    let cost_score = engine.cost_tier.cost_score();
    EngineScore {
        engine_id: engine.id.clone(),
        score: CAPABILITY_WEIGHT * capability_match
            + RELIABILITY_WEIGHT * engine.reliability
            + COST_WEIGHT * cost_score,
        capability_match,
        reliability: engine.reliability,
        cost_score,
    }
}

/// Rank registry engines able to render `required`.
pub fn rank_engines(
    registry: &EngineRegistry,
    required: &RequiredCapabilities,
    excluded: &BTreeSet<String>,
    cost_ceiling: Option<CostTier>,
) -> EngineRanking {
    let mut ranking = EngineRanking::default();

    for engine in &registry.engines {
        let mut reasons = Vec::new();
        if !engine.available {
            reasons.push("unavailable".to_string());
        }
        if excluded.contains(&engine.id) {
            reasons.push("already attempted".to_string());
        }
        if let Some(ceiling) = cost_ceiling {
            if engine.cost_tier > ceiling {
                reasons.push(format!(
                    "cost tier {} above ceiling {}",
                    engine.cost_tier, ceiling
                ));
            }
        }
        reasons.extend(required.mismatches(&engine.capabilities));

        if reasons.is_empty() {
            ranking.ranked.push(score_engine(engine));
        } else {
            ranking.disqualified.push(Disqualified {
                engine_id: engine.id.clone(),
                reasons,
            });
        }
    }

    // Stable sort keeps registry order among equal scores
    ranking
        .ranked
        .sort_by(|a, b| b.score.total_cmp(&a.score));
    ranking
}
