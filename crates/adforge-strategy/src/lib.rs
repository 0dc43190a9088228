//! Strategy decision engine.
//!
//! Turns an [`AnalyzedVideo`](adforge_models::AnalyzedVideo) into a ranked
//! set of remediation strategies:
//!
//! 1. [`detector`] finds problems and applies the no-action circuit breaker
//! 2. [`candidates`] instantiates the [`frameworks`] table against the video
//! 3. [`scorer`] weighs impact, risk, cost and historical [`trust`]
//! 4. [`selector`] enforces risk tolerance and framework diversity
//! 5. [`explain`] writes the justifications
//!
//! [`decide`] runs the whole chain and is deterministic.

pub mod candidates;
pub mod detector;
pub mod engine;
pub mod explain;
pub mod frameworks;
pub mod scorer;
pub mod selector;
pub mod trust;

#[cfg(test)]
pub(crate) mod test_support;

pub use detector::{detect, Detection};
pub use engine::{
    decide, DecisionOutcome, DecisionRequest, RankedStrategy, RejectedAlternative,
    DEFAULT_MAX_STRATEGIES,
};
pub use selector::RejectionReason;
pub use trust::framework_trust;
