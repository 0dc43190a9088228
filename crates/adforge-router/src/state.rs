//! Per-job routing state with append-only history.

use adforge_models::{DegradationLevel, JobId, RouteState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RouterError, RouterResult};

/// One entry of the job history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: RouteState,
    pub to: RouteState,
    pub at: DateTime<Utc>,
    pub level: DegradationLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
}

/// Routing state of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStateContext {
    pub job_id: JobId,
    pub state: RouteState,
    pub level: DegradationLevel,
    /// Engine calls made so far
    pub attempts: u32,
    pub history: Vec<TransitionRecord>,
}

impl JobStateContext {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            state: RouteState::Pending,
            level: DegradationLevel::Normal,
            attempts: 0,
            history: Vec::new(),
        }
    }

    /// Move to `to`, appending a history record.
    pub fn transition(
        &mut self,
        to: RouteState,
        engine_id: Option<&str>,
        error_code: Option<&str>,
        note: impl Into<String>,
    ) -> RouterResult<()> {
        if !self.state.can_transition_to(to) {
            return Err(RouterError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.history.push(TransitionRecord {
            from: self.state,
            to,
            at: Utc::now(),
            level: self.level,
            engine_id: engine_id.map(str::to_string),
            error_code: error_code.map(str::to_string),
            note: note.into(),
        });
        self.state = to;
        Ok(())
    }

    /// Raise the degradation level. Returns false if `level` is not higher.
    pub fn escalate(&mut self, level: DegradationLevel) -> bool {
        if level > self.level {
            self.level = level;
            true
        } else {
            false
        }
    }

    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Engines that were executed, in order, without repeats.
    pub fn engines_attempted(&self) -> Vec<String> {
        let mut engines: Vec<String> = Vec::new();
        for record in &self.history {
            if record.to == RouteState::Executing {
                if let Some(id) = &record.engine_id {
                    if !engines.contains(id) {
                        engines.push(id.clone());
                    }
                }
            }
        }
        engines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_history() {
        let mut ctx = JobStateContext::new(JobId::from_string("job-1"));
        ctx.transition(RouteState::Routing, None, None, "").unwrap();
        ctx.transition(RouteState::Executing, Some("ffmpeg"), None, "")
            .unwrap();
        ctx.transition(RouteState::Validating, Some("ffmpeg"), None, "")
            .unwrap();
        ctx.transition(RouteState::Completed, Some("ffmpeg"), None, "done")
            .unwrap();

        assert!(ctx.is_terminal());
        assert_eq!(ctx.history.len(), 4);
        assert_eq!(ctx.history[0].from, RouteState::Pending);
        assert_eq!(ctx.history[3].note, "done");
        assert_eq!(ctx.engines_attempted(), vec!["ffmpeg".to_string()]);
    }

    #[test]
    fn test_illegal_transition_leaves_state() {
        let mut ctx = JobStateContext::new(JobId::from_string("job-2"));
        let err = ctx
            .transition(RouteState::Completed, None, None, "")
            .unwrap_err();
        assert!(matches!(err, RouterError::InvalidTransition { .. }));
        assert_eq!(ctx.state, RouteState::Pending);
        assert!(ctx.history.is_empty());
    }

    #[test]
    fn test_escalation_is_monotonic() {
        let mut ctx = JobStateContext::new(JobId::from_string("job-3"));
        assert!(ctx.escalate(DegradationLevel::Simplify));
        assert!(!ctx.escalate(DegradationLevel::RetrySame));
        assert_eq!(ctx.level, DegradationLevel::Simplify);
        assert!(ctx.escalate(DegradationLevel::PartialSuccess));
    }

    #[test]
    fn test_history_serializes() {
        let mut ctx = JobStateContext::new(JobId::from_string("job-4"));
        ctx.transition(RouteState::Routing, None, None, "").unwrap();
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["history"][0]["to"], "routing");
        assert_eq!(json["level"], "normal");
        assert!(json["history"][0].get("engine_id").is_none());
    }
}
