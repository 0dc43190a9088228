//! Historical trust per framework.

use adforge_models::{Framework, HistoricalOutcome};

/// Laplace-smoothed success rate of a framework over past uses.
///
/// With no history the trust is 0.5. Adding a successful use never lowers
/// the value; adding an unsuccessful one never raises it.
pub fn framework_trust(framework: Framework, history: &[HistoricalOutcome]) -> f64 {
    let (uses, successes) = history
        .iter()
        .filter(|h| h.framework == framework)
        .fold((0u32, 0u32), |(n, s), h| (n + 1, s + h.is_success() as u32));

    (successes as f64 + 1.0) / (uses as f64 + 2.0)
}
