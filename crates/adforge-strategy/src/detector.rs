//! Problem detection.
//!
//! Converts raw analysis signals into a ranked list of problems, or a
//! "no action needed" verdict when the worst problem is mild.

use std::cmp::Ordering;

use adforge_models::{AnalyzedVideo, DetectedProblem, ProblemType, SegmentType};

/// Below this worst-case severity the video is left alone.
pub const NO_ACTION_THRESHOLD: f64 = 0.3;
/// Problems below this severity are not worth a strategy.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.25;
/// Maximum problems handed to candidate generation.
pub const MAX_PROBLEMS: usize = 4;

pub const HOOK_SCORE_THRESHOLD: f64 = 70.0;
pub const CTA_STRENGTH_THRESHOLD: f64 = 0.6;
pub const PROOF_MISSING_SEVERITY: f64 = 0.55;
pub const ATTENTION_VARIANCE_THRESHOLD: f64 = 0.15;
pub const PACING_CONSISTENCY_THRESHOLD: f64 = 0.5;
pub const SLOW_PACING_THRESHOLD: f64 = 0.45;
pub const ATTENTION_DROP_THRESHOLD: f64 = 0.3;
pub const BENEFIT_CLARITY_THRESHOLD: f64 = 0.5;

const MISSING_BENEFIT_SEVERITY: f64 = 0.45;
// Largest possible population variance of values in [0, 1].
const MAX_UNIT_VARIANCE: f64 = 0.25;
const ATTENTION_DROP_SCALE: f64 = 0.5;

/// Result of problem detection.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// Nothing severe enough to act on.
    NoAction {
        max_severity: f64,
        /// Mild problems that were found, for reporting
        observed: Vec<DetectedProblem>,
    },
    /// Significant problems, most severe first, at most [`MAX_PROBLEMS`].
    Problems(Vec<DetectedProblem>),
}

/// Run detection and apply the no-action circuit breaker and significance cut.
pub fn detect(video: &AnalyzedVideo) -> Detection {
    let all = detect_all(video);
    let max_severity = all.first().map(|p| p.severity).unwrap_or(0.0);

    if max_severity < NO_ACTION_THRESHOLD {
        return Detection::NoAction {
            max_severity,
            observed: all,
        };
    }

    let problems = all
        .into_iter()
        .filter(|p| p.severity >= SIGNIFICANCE_THRESHOLD)
        .take(MAX_PROBLEMS)
        .collect();

    Detection::Problems(problems)
}

/// Every checkable problem, sorted by descending severity.
pub fn detect_all(video: &AnalyzedVideo) -> Vec<DetectedProblem> {
    let mut problems: Vec<DetectedProblem> = [
        check_hook(video),
        check_cta(video),
        check_proof(video),
        check_pacing_consistency(video),
        check_slow_pacing(video),
        check_attention_drop(video),
        check_benefit(video),
    ]
    .into_iter()
    .flatten()
    .collect();

    problems.sort_by(|a, b| {
        b.severity
            .partial_cmp(&a.severity)
            .unwrap_or(Ordering::Equal)
            .then(a.problem_type.cmp(&b.problem_type))
    });
    problems
}

fn check_hook(video: &AnalyzedVideo) -> Option<DetectedProblem> {
    let hook = video.scores.hook_score;
    if hook >= HOOK_SCORE_THRESHOLD {
        return None;
    }
    let problem = DetectedProblem::new(
        ProblemType::HookWeak,
        1.0 - hook / 100.0,
        format!("Hook score {:.0}/100 is below {:.0}", hook, HOOK_SCORE_THRESHOLD),
    );
    Some(match video.segments_of(SegmentType::Hook).next() {
        Some(segment) => problem.with_segment(&segment.id),
        None => problem,
    })
}

fn check_cta(video: &AnalyzedVideo) -> Option<DetectedProblem> {
    let cta = video.scores.cta_strength;
    if cta >= CTA_STRENGTH_THRESHOLD {
        return None;
    }
    let problem = DetectedProblem::new(
        ProblemType::CtaWeak,
        1.0 - cta,
        format!("CTA strength {:.2} is below {:.2}", cta, CTA_STRENGTH_THRESHOLD),
    );
    Some(match video.segments_of(SegmentType::Cta).last() {
        Some(segment) => problem.with_segment(&segment.id),
        None => problem,
    })
}

fn check_proof(video: &AnalyzedVideo) -> Option<DetectedProblem> {
    if video.has_proof() {
        return None;
    }
    Some(DetectedProblem::new(
        ProblemType::ProofMissing,
        PROOF_MISSING_SEVERITY,
        "No testimonial, statistic or demo backs the claims",
    ))
}

fn check_pacing_consistency(video: &AnalyzedVideo) -> Option<DetectedProblem> {
    let curve = video.attention_curve();
    let variance = variance(&curve);
    let consistency = video.scores.pacing_consistency;

    let from_variance = (variance > ATTENTION_VARIANCE_THRESHOLD)
        .then(|| (variance / MAX_UNIT_VARIANCE).min(1.0));
    let from_consistency =
        (consistency < PACING_CONSISTENCY_THRESHOLD).then(|| 1.0 - consistency);

    let severity = match (from_variance, from_consistency) {
        (None, None) => return None,
        (a, b) => a.unwrap_or(0.0).max(b.unwrap_or(0.0)),
    };

    Some(DetectedProblem::new(
        ProblemType::PacingInconsistent,
        severity,
        format!(
            "Attention variance {:.2}, pacing consistency {:.2}",
            variance, consistency
        ),
    ))
}

fn check_slow_pacing(video: &AnalyzedVideo) -> Option<DetectedProblem> {
    let mean = video.mean_pacing()?;
    if mean >= SLOW_PACING_THRESHOLD {
        return None;
    }
    let slowest = video.segments.iter().min_by(|a, b| {
        a.pacing.partial_cmp(&b.pacing).unwrap_or(Ordering::Equal)
    });
    let problem = DetectedProblem::new(
        ProblemType::PacingSlow,
        1.0 - mean,
        format!("Mean pacing {:.2} is below {:.2}", mean, SLOW_PACING_THRESHOLD),
    );
    Some(match slowest {
        Some(segment) => problem.with_segment(&segment.id),
        None => problem,
    })
}

fn check_attention_drop(video: &AnalyzedVideo) -> Option<DetectedProblem> {
    let curve = video.attention_curve();
    let (index, drop) = curve
        .windows(2)
        .enumerate()
        .map(|(i, w)| (i + 1, w[0] - w[1]))
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, bd)) if bd >= d => best,
            _ => Some((i, d)),
        })?;

    if drop <= ATTENTION_DROP_THRESHOLD {
        return None;
    }

    let problem = DetectedProblem::new(
        ProblemType::AttentionDrop,
        (drop / ATTENTION_DROP_SCALE).min(1.0),
        format!("Attention falls by {:.2} at point {}", drop, index),
    );
    Some(match segment_at_curve_point(video, index, curve.len()) {
        Some(id) => problem.with_segment(id),
        None => problem,
    })
}

fn check_benefit(video: &AnalyzedVideo) -> Option<DetectedProblem> {
    let best_clarity = video
        .segments
        .iter()
        .filter(|s| matches!(s.segment_type, SegmentType::Benefit | SegmentType::Solution))
        .map(|s| s.clarity)
        .fold(None, |acc: Option<f64>, c| Some(acc.map_or(c, |a| a.max(c))));

    match best_clarity {
        None => Some(DetectedProblem::new(
            ProblemType::BenefitUnclear,
            MISSING_BENEFIT_SEVERITY,
            "No benefit or solution segment states what the product does",
        )),
        Some(clarity) if clarity < BENEFIT_CLARITY_THRESHOLD => Some(DetectedProblem::new(
            ProblemType::BenefitUnclear,
            1.0 - clarity,
            format!("Best benefit clarity {:.2} is below {:.2}", clarity, BENEFIT_CLARITY_THRESHOLD),
        )),
        Some(_) => None,
    }
}

/// Map a curve point back to the segment covering it.
fn segment_at_curve_point(video: &AnalyzedVideo, index: usize, points: usize) -> Option<&str> {
    if video.scores.attention_curve.is_empty() {
        return video.segments.get(index).map(|s| s.id.as_str());
    }
    let at_ms = video.duration_ms.saturating_mul(index as u64) / points.max(1) as u64;
    video
        .segments
        .iter()
        .find(|s| s.start_ms <= at_ms && at_ms < s.end_ms)
        .map(|s| s.id.as_str())
}

fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}
