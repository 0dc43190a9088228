//! Framework table.
//!
//! Each framework maps to a fixed set of action templates. Templates are
//! resolved against the analyzed video during candidate generation.

use adforge_models::{ActionKind, Framework, ProblemType, SegmentType};

/// Asset the Proof Stack framework overlays when the ad has no proof.
pub const TESTIMONIAL_ASSET: &str = "testimonial_card";

/// Which segments of the target type an action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScope {
    /// First segment of the type, by id
    First,
    /// Last segment of the type, by id
    Last,
    /// Every segment of the type
    All,
}

/// One action a framework wants to take.
#[derive(Debug, Clone, Copy)]
pub struct ActionTemplate {
    pub kind: ActionKind,
    pub target: SegmentType,
    pub scope: TargetScope,
    pub factor: Option<f64>,
    pub asset: Option<&'static str>,
    pub intent: &'static str,
    /// Problems this action contributes to solving
    pub addresses: &'static [ProblemType],
}

/// Static description of a framework.
#[derive(Debug, Clone, Copy)]
pub struct FrameworkSpec {
    pub framework: Framework,
    pub solves: &'static [ProblemType],
    /// Minimum severity of a solved problem before the framework is considered
    pub min_severity: f64,
    pub base_risk: f64,
    pub base_cost: f64,
    /// Multiplier on the impact term
    pub effectiveness: f64,
    pub needs_reorder: bool,
    pub actions: &'static [ActionTemplate],
}

impl FrameworkSpec {
    /// Whether this framework is triggered by a problem of the given severity.
    pub fn triggered_by(&self, problem: ProblemType, severity: f64) -> bool {
        self.solves.contains(&problem) && severity >= self.min_severity
    }
}

const fn action(
    kind: ActionKind,
    target: SegmentType,
    scope: TargetScope,
    factor: Option<f64>,
    intent: &'static str,
    addresses: &'static [ProblemType],
) -> ActionTemplate {
    ActionTemplate {
        kind,
        target,
        scope,
        factor,
        asset: None,
        intent,
        addresses,
    }
}

use ActionKind::{Compress, Emphasize, Merge, Remove, Reorder, Split};
use ProblemType::{
    AttentionDrop, BenefitUnclear, CtaWeak, HookWeak, PacingInconsistent, PacingSlow, ProofMissing,
};
use TargetScope::{All, First, Last};

static HOOK_FIRST: FrameworkSpec = FrameworkSpec {
    framework: Framework::HookFirst,
    solves: &[HookWeak, AttentionDrop],
    min_severity: 0.3,
    base_risk: 0.25,
    base_cost: 0.3,
    effectiveness: 1.0,
    needs_reorder: true,
    actions: &[
        action(Emphasize, SegmentType::Hook, First, Some(0.9), "Let the opening beat land", &[HookWeak]),
        action(Compress, SegmentType::Filler, All, Some(1.4), "Cut dead air before the payoff", &[AttentionDrop]),
        action(Reorder, SegmentType::Benefit, First, Some(0.0), "Lead with the payoff", &[HookWeak]),
    ],
};

static PROBLEM_AGITATE_SOLUTION: FrameworkSpec = FrameworkSpec {
    framework: Framework::ProblemAgitateSolution,
    solves: &[HookWeak, BenefitUnclear, PacingSlow],
    min_severity: 0.35,
    base_risk: 0.45,
    base_cost: 0.5,
    effectiveness: 1.0,
    needs_reorder: true,
    actions: &[
        action(Reorder, SegmentType::Problem, First, Some(0.0), "Open on the pain point", &[HookWeak]),
        action(Emphasize, SegmentType::Solution, First, Some(0.9), "Slow down on the reveal", &[BenefitUnclear]),
        action(Compress, SegmentType::Filler, All, Some(1.3), "Keep the agitation tight", &[PacingSlow]),
    ],
};

static PROOF_STACK: FrameworkSpec = FrameworkSpec {
    framework: Framework::ProofStack,
    solves: &[ProofMissing, CtaWeak],
    min_severity: 0.3,
    base_risk: 0.35,
    base_cost: 0.45,
    effectiveness: 1.0,
    needs_reorder: false,
    actions: &[
        ActionTemplate {
            kind: Emphasize,
            target: SegmentType::Cta,
            scope: Last,
            factor: Some(0.9),
            asset: Some(TESTIMONIAL_ASSET),
            intent: "Back the offer with a testimonial card",
            addresses: &[ProofMissing, CtaWeak],
        },
        action(Emphasize, SegmentType::Proof, First, Some(0.85), "Hold on the existing proof", &[ProofMissing]),
    ],
};

static DIRECT_RESPONSE: FrameworkSpec = FrameworkSpec {
    framework: Framework::DirectResponse,
    solves: &[CtaWeak],
    min_severity: 0.3,
    base_risk: 0.2,
    base_cost: 0.2,
    effectiveness: 1.0,
    needs_reorder: false,
    actions: &[
        action(Emphasize, SegmentType::Cta, Last, Some(0.85), "Give the offer room to breathe", &[CtaWeak]),
        action(Merge, SegmentType::Benefit, Last, None, "Blend the benefit straight into the offer", &[CtaWeak]),
        action(Compress, SegmentType::Filler, All, Some(1.25), "Reach the offer sooner", &[CtaWeak]),
    ],
};

static RAPID_CUT: FrameworkSpec = FrameworkSpec {
    framework: Framework::RapidCut,
    solves: &[PacingSlow, PacingInconsistent, AttentionDrop],
    min_severity: 0.3,
    base_risk: 0.3,
    base_cost: 0.25,
    effectiveness: 1.0,
    needs_reorder: false,
    actions: &[
        action(Remove, SegmentType::Filler, All, None, "Drop filler beats", &[PacingSlow, AttentionDrop]),
        action(Compress, SegmentType::Problem, All, Some(1.2), "Tighten the setup", &[PacingSlow, PacingInconsistent]),
        action(Split, SegmentType::Solution, First, Some(0.5), "Add a hard cut to reset attention", &[PacingInconsistent, AttentionDrop]),
    ],
};

static STORY_ARC: FrameworkSpec = FrameworkSpec {
    framework: Framework::StoryArc,
    solves: &[BenefitUnclear, AttentionDrop, HookWeak],
    min_severity: 0.4,
    base_risk: 0.55,
    base_cost: 0.55,
    effectiveness: 1.0,
    needs_reorder: true,
    actions: &[
        action(Reorder, SegmentType::Benefit, First, Some(1.0), "Surface the benefit right after the hook", &[BenefitUnclear, HookWeak]),
        action(Reorder, SegmentType::Proof, First, Some(2.0), "Follow the benefit with proof", &[AttentionDrop]),
        action(Emphasize, SegmentType::Benefit, First, Some(0.9), "Dwell on the benefit", &[BenefitUnclear]),
        action(Merge, SegmentType::Problem, Last, None, "Smooth the turn from problem to solution", &[AttentionDrop]),
    ],
};

static GENERIC_POLISH: FrameworkSpec = FrameworkSpec {
    framework: Framework::GenericPolish,
    solves: ProblemType::ALL,
    min_severity: 0.25,
    base_risk: 0.1,
    base_cost: 0.1,
    effectiveness: 0.6,
    needs_reorder: false,
    actions: &[
        action(Compress, SegmentType::Filler, All, Some(1.1), "Trim slack", &[PacingSlow, PacingInconsistent, AttentionDrop]),
        action(Emphasize, SegmentType::Hook, First, Some(0.95), "Slightly hold the opening", &[HookWeak]),
        action(Emphasize, SegmentType::Cta, Last, Some(0.95), "Slightly hold the offer", &[CtaWeak, BenefitUnclear]),
    ],
};

/// Table entry for a framework.
pub fn spec(framework: Framework) -> &'static FrameworkSpec {
    match framework {
        Framework::HookFirst => &HOOK_FIRST,
        Framework::ProblemAgitateSolution => &PROBLEM_AGITATE_SOLUTION,
        Framework::ProofStack => &PROOF_STACK,
        Framework::DirectResponse => &DIRECT_RESPONSE,
        Framework::RapidCut => &RAPID_CUT,
        Framework::StoryArc => &STORY_ARC,
        Framework::GenericPolish => &GENERIC_POLISH,
    }
}

/// All table entries in framework order.
pub fn all() -> impl Iterator<Item = &'static FrameworkSpec> {
    Framework::ALL.iter().map(|f| spec(*f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_consistent() {
        for entry in all() {
            assert!(!entry.actions.is_empty(), "{} has no actions", entry.framework);
            assert!((0.0..=1.0).contains(&entry.base_risk));
            assert!((0.0..=1.0).contains(&entry.base_cost));

            let reorders = entry.actions.iter().any(|a| a.kind == Reorder);
            assert_eq!(reorders, entry.needs_reorder, "{}", entry.framework);

            // Every action only claims problems the framework solves
            for template in entry.actions {
                for problem in template.addresses {
                    assert!(entry.solves.contains(problem), "{} {}", entry.framework, problem);
                }
            }
        }
    }

    #[test]
    fn test_generic_polish_is_the_only_fallback() {
        let fallbacks: Vec<_> = all().filter(|e| e.framework.is_generic_fallback()).collect();
        assert_eq!(fallbacks.len(), 1);
        assert!(fallbacks[0].effectiveness < 1.0);
    }

    #[test]
    fn test_trigger_respects_min_severity() {
        let story = spec(Framework::StoryArc);
        assert!(!story.triggered_by(HookWeak, 0.35));
        assert!(story.triggered_by(HookWeak, 0.4));
        assert!(!story.triggered_by(CtaWeak, 0.9));
    }
}
