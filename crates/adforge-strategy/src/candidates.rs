//! Candidate generation from the framework table.

use std::collections::BTreeSet;

use adforge_models::{
    ActionKind, AnalyzedVideo, DetectedProblem, ProblemType, SegmentTarget, StrategyAction,
    StrategyCandidate,
};
use tracing::debug;

use crate::frameworks::{self, ActionTemplate, FrameworkSpec, TargetScope};

/// Reordering is contraindicated below this source duration.
pub const MIN_REORDER_DURATION_MS: u64 = 15_000;

const REORDER_RISK_STEP: f64 = 0.05;
const ACTION_COST_STEP: f64 = 0.02;

/// Generate one candidate per applicable framework, in framework order.
///
/// Never fails: frameworks that cannot produce a useful candidate for this
/// video are skipped.
pub fn generate(
    video: &AnalyzedVideo,
    problems: &[DetectedProblem],
    forbidden: &BTreeSet<ActionKind>,
) -> Vec<StrategyCandidate> {
    let mut candidates = Vec::new();

    for entry in frameworks::all() {
        if !is_triggered(entry, problems) {
            continue;
        }
        if entry.needs_reorder && video.duration_ms < MIN_REORDER_DURATION_MS {
            debug!(
                framework = entry.framework.as_str(),
                duration_ms = video.duration_ms,
                "Skipping reorder framework on short video"
            );
            continue;
        }

        match build_candidate(entry, video, problems, forbidden, candidates.len() + 1) {
            Some(candidate) => candidates.push(candidate),
            None => debug!(
                framework = entry.framework.as_str(),
                "Framework produced no usable actions"
            ),
        }
    }

    candidates
}

fn is_triggered(entry: &FrameworkSpec, problems: &[DetectedProblem]) -> bool {
    problems
        .iter()
        .any(|p| entry.triggered_by(p.problem_type, p.severity))
}

fn build_candidate(
    entry: &FrameworkSpec,
    video: &AnalyzedVideo,
    problems: &[DetectedProblem],
    forbidden: &BTreeSet<ActionKind>,
    ordinal: usize,
) -> Option<StrategyCandidate> {
    let detected: BTreeSet<ProblemType> = problems.iter().map(|p| p.problem_type).collect();

    let mut actions = Vec::new();
    let mut solved = BTreeSet::new();

    for template in entry.actions {
        if forbidden.contains(&template.kind) {
            continue;
        }
        let Some(action) = resolve(template, video) else {
            continue;
        };
        solved.extend(
            template
                .addresses
                .iter()
                .copied()
                .filter(|p| detected.contains(p)),
        );
        actions.push(action);
    }

    if actions.is_empty() || solved.is_empty() {
        return None;
    }

    let reorders = actions
        .iter()
        .filter(|a| a.kind == ActionKind::Reorder)
        .count();
    let risk = (entry.base_risk + REORDER_RISK_STEP * reorders as f64).clamp(0.0, 1.0);
    let cost = (entry.base_cost + ACTION_COST_STEP * actions.len() as f64).clamp(0.0, 1.0);

    Some(StrategyCandidate {
        id: format!("{}-{}", entry.framework.as_str(), ordinal),
        framework: entry.framework,
        solves: solved.into_iter().collect(),
        risk,
        cost,
        actions,
    })
}

/// Bind a template to concrete segments, or `None` when the video has no
/// segment of the target type.
fn resolve(template: &ActionTemplate, video: &AnalyzedVideo) -> Option<StrategyAction> {
    let mut matching = video.segments_of(template.target);
    let target = match template.scope {
        TargetScope::First => SegmentTarget::Id(matching.next()?.id.clone()),
        TargetScope::Last => SegmentTarget::Id(matching.last()?.id.clone()),
        TargetScope::All => {
            matching.next()?;
            SegmentTarget::Type(template.target)
        }
    };

    let mut action = StrategyAction::new(template.kind, target, template.intent);
    if let Some(factor) = template.factor {
        action = action.with_factor(factor);
    }
    if let Some(asset) = template.asset {
        action = action.with_asset(asset);
    }
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::weak_video;
    use adforge_models::Framework;

    fn scenario_problems() -> Vec<DetectedProblem> {
        vec![
            DetectedProblem::new(ProblemType::CtaWeak, 0.7, "cta"),
            DetectedProblem::new(ProblemType::HookWeak, 0.6, "hook"),
            DetectedProblem::new(ProblemType::ProofMissing, 0.55, "proof"),
        ]
    }

    #[test]
    fn test_candidates_only_claim_detected_problems() {
        let problems = scenario_problems();
        let candidates = generate(&weak_video(), &problems, &BTreeSet::new());
        assert!(!candidates.is_empty());
        for candidate in &candidates {
            assert!(!candidate.actions.is_empty());
            assert!(!candidate.solves.is_empty());
            for solved in &candidate.solves {
                assert!(problems.iter().any(|p| p.problem_type == *solved));
            }
        }
    }

    #[test]
    fn test_missing_segments_drop_actions() {
        let candidates = generate(&weak_video(), &scenario_problems(), &BTreeSet::new());
        let direct = candidates
            .iter()
            .find(|c| c.framework == Framework::DirectResponse)
            .unwrap();
        // No filler segment, so the compress action is gone
        assert!(direct.actions.iter().all(|a| a.kind != ActionKind::Compress));
        assert_eq!(direct.solves, vec![ProblemType::CtaWeak]);
    }

    #[test]
    fn test_forbidden_kinds_removed() {
        let forbidden = BTreeSet::from([ActionKind::Reorder]);
        let candidates = generate(&weak_video(), &scenario_problems(), &forbidden);
        assert!(candidates
            .iter()
            .flat_map(|c| c.actions.iter())
            .all(|a| a.kind != ActionKind::Reorder));
    }

    #[test]
    fn test_short_video_skips_reorder_frameworks() {
        let mut video = weak_video();
        video.duration_ms = 12_000;
        let candidates = generate(&video, &scenario_problems(), &BTreeSet::new());
        assert!(candidates
            .iter()
            .all(|c| !frameworks::spec(c.framework).needs_reorder));
    }

    #[test]
    fn test_reorder_adds_risk() {
        let candidates = generate(&weak_video(), &scenario_problems(), &BTreeSet::new());
        let hook_first = candidates
            .iter()
            .find(|c| c.framework == Framework::HookFirst)
            .unwrap();
        assert!((hook_first.risk - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_no_problems_no_candidates() {
        assert!(generate(&weak_video(), &[], &BTreeSet::new()).is_empty());
    }
}
