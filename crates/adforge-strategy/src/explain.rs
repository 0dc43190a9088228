//! Human-readable justifications and rejection lines.

use adforge_models::{DetectedProblem, RiskTolerance, ScoredStrategy};

use crate::selector::{Rejection, RejectionReason};

/// Justification for a selected strategy, referencing the problems it solves.
pub fn justify(strategy: &ScoredStrategy, problems: &[DetectedProblem], rank: usize) -> String {
    let solved: Vec<String> = problems
        .iter()
        .filter(|p| strategy.candidate.solves_problem(p.problem_type))
        .map(|p| format!("{} (severity {:.2})", p.problem_type.describe(), p.severity))
        .collect();

    let lead = if rank == 0 {
        format!("{} is the top pick", strategy.framework().display_name())
    } else {
        format!(
            "{} is alternative #{}",
            strategy.framework().display_name(),
            rank + 1
        )
    };

    let b = &strategy.breakdown;
    let mut text = format!(
        "{}: it addresses {} with {} action(s). Score {:.2} (impact +{:.2}, risk -{:.2}, cost -{:.2}, trust +{:.2}",
        lead,
        join_problems(&solved),
        strategy.candidate.actions.len(),
        strategy.final_score,
        b.impact,
        b.risk_penalty,
        b.cost_penalty,
        b.trust_bonus,
    );
    if b.fallback_penalty > 0.0 {
        text.push_str(&format!(", fallback -{:.2}", b.fallback_penalty));
    }
    text.push_str(&format!("), risk {:.2}.", strategy.candidate.risk));
    text
}

/// One-line reason a candidate was not selected.
pub fn rejection_line(
    rejection: &Rejection,
    top: Option<&ScoredStrategy>,
    tolerance: RiskTolerance,
) -> String {
    let s = &rejection.strategy;
    let name = s.framework().display_name();
    match rejection.reason {
        RejectionReason::RiskExceeded => format!(
            "{}: risk {:.2} exceeds the {} tolerance ceiling of {:.2}",
            name,
            s.candidate.risk,
            tolerance,
            tolerance.ceiling()
        ),
        RejectionReason::SolvesFewerProblems => match top {
            Some(top) => format!(
                "{}: solves {} problem(s) versus {} for {}",
                name,
                s.candidate.solves.len(),
                top.candidate.solves.len(),
                top.framework().display_name()
            ),
            None => format!("{}: solves fewer problems", name),
        },
        RejectionReason::LowerScore => match top {
            Some(top) => format!(
                "{}: lower score ({:.2} vs {:.2})",
                name, s.final_score, top.final_score
            ),
            None => format!("{}: lower score ({:.2})", name, s.final_score),
        },
        RejectionReason::DiversityPreference => {
            format!("{}: skipped in favour of a different framework", name)
        }
    }
}

fn join_problems(items: &[String]) -> String {
    match items {
        [] => "no detected problem".to_string(),
        [one] => one.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}
