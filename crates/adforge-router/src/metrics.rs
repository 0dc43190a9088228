//! Router metrics.

use metrics::{counter, histogram};

use adforge_models::DegradationLevel;

/// Metric names as constants for consistency.
pub mod names {
    pub const ROUTES_TOTAL: &str = "adforge_routes_total";
    pub const ROUTE_DURATION_SECONDS: &str = "adforge_route_duration_seconds";
    pub const ENGINE_ATTEMPTS_TOTAL: &str = "adforge_engine_attempts_total";
    pub const ENGINE_FAILURES_TOTAL: &str = "adforge_engine_failures_total";
    pub const DEGRADATIONS_TOTAL: &str = "adforge_degradations_total";
}

/// Record the terminal outcome of a route.
pub fn record_route(outcome: &'static str, level: DegradationLevel, duration_secs: f64) {
    let labels = [
        ("outcome", outcome.to_string()),
        ("level", level.as_str().to_string()),
    ];
    counter!(names::ROUTES_TOTAL, &labels).increment(1);
    histogram!(names::ROUTE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one engine attempt.
pub fn record_attempt(engine_id: &str) {
    counter!(names::ENGINE_ATTEMPTS_TOTAL, "engine" => engine_id.to_string()).increment(1);
}

/// Record a failed engine attempt.
pub fn record_failure(engine_id: &str, code: &'static str) {
    let labels = [("engine", engine_id.to_string()), ("code", code.to_string())];
    counter!(names::ENGINE_FAILURES_TOTAL, &labels).increment(1);
}

/// Record an escalation on the degradation ladder.
pub fn record_degradation(level: DegradationLevel) {
    counter!(names::DEGRADATIONS_TOTAL, "level" => level.as_str()).increment(1);
}
