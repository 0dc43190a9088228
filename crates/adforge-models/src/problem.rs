//! Detected problem models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of problems the detector can report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemType {
    HookWeak,
    CtaWeak,
    ProofMissing,
    PacingInconsistent,
    PacingSlow,
    AttentionDrop,
    BenefitUnclear,
}

impl ProblemType {
    pub const ALL: &'static [ProblemType] = &[
        ProblemType::HookWeak,
        ProblemType::CtaWeak,
        ProblemType::ProofMissing,
        ProblemType::PacingInconsistent,
        ProblemType::PacingSlow,
        ProblemType::AttentionDrop,
        ProblemType::BenefitUnclear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::HookWeak => "HOOK_WEAK",
            ProblemType::CtaWeak => "CTA_WEAK",
            ProblemType::ProofMissing => "PROOF_MISSING",
            ProblemType::PacingInconsistent => "PACING_INCONSISTENT",
            ProblemType::PacingSlow => "PACING_SLOW",
            ProblemType::AttentionDrop => "ATTENTION_DROP",
            ProblemType::BenefitUnclear => "BENEFIT_UNCLEAR",
        }
    }

    /// Short phrase for explanations ("a weak hook").
    pub fn describe(&self) -> &'static str {
        match self {
            ProblemType::HookWeak => "a weak opening hook",
            ProblemType::CtaWeak => "an unclear call to action",
            ProblemType::ProofMissing => "missing social proof",
            ProblemType::PacingInconsistent => "inconsistent pacing",
            ProblemType::PacingSlow => "slow pacing",
            ProblemType::AttentionDrop => "a sharp attention drop",
            ProblemType::BenefitUnclear => "an unclear product benefit",
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A problem found in an analyzed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedProblem {
    #[serde(rename = "type")]
    pub problem_type: ProblemType,

    /// Severity (0-1)
    pub severity: f64,

    /// Segment the problem originates from, if localized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,

    /// Human-readable detail
    pub detail: String,
}

impl DetectedProblem {
    pub fn new(problem_type: ProblemType, severity: f64, detail: impl Into<String>) -> Self {
        Self {
            problem_type,
            severity: severity.clamp(0.0, 1.0),
            segment_id: None,
            detail: detail.into(),
        }
    }

    pub fn with_segment(mut self, segment_id: impl Into<String>) -> Self {
        self.segment_id = Some(segment_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_type_wire_format() {
        let json = serde_json::to_string(&ProblemType::ProofMissing).unwrap();
        assert_eq!(json, "\"PROOF_MISSING\"");
        let parsed: ProblemType = serde_json::from_str("\"CTA_WEAK\"").unwrap();
        assert_eq!(parsed, ProblemType::CtaWeak);
    }

    #[test]
    fn test_severity_is_clamped() {
        let problem = DetectedProblem::new(ProblemType::HookWeak, 1.4, "too strong");
        assert_eq!(problem.severity, 1.0);
    }
}
