//! Render progress reporting and FFmpeg progress parsing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Engine-agnostic progress event forwarded to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderProgress {
    /// 0-100
    pub percent: f64,
    pub message: String,
}

impl RenderProgress {
    pub fn new(percent: f64, message: impl Into<String>) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
            message: message.into(),
        }
    }
}

/// Progress callback type.
///
/// Receives progress events and forwards them wherever the caller wants
/// (logs, a channel, a UI).
pub type ProgressCallback = Arc<dyn Fn(RenderProgress) + Send + Sync>;

/// A callback that drops every event.
pub fn noop_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Progress information from FFmpeg's `-progress` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Calculate progress percentage given total duration in milliseconds.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if self.is_complete {
            return 100.0;
        }
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).clamp(0.0, 100.0)
    }

    /// Convert into a caller-facing event.
    pub fn to_render_progress(&self, total_duration_ms: i64) -> RenderProgress {
        let message = if self.is_complete {
            "Encoding finished".to_string()
        } else {
            format!("Encoding frame {} at {:.1}x", self.frame, self.speed)
        };
        RenderProgress::new(self.percentage(total_duration_ms), message)
    }
}

/// Parse one line of FFmpeg's `-progress` output.
///
/// Returns a snapshot each time a `progress=` line closes a block.
pub fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        // FFmpeg reports both keys in microseconds
        "out_time_us" | "out_time_ms" => {
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "fps" => {
            if let Ok(fps) = value.parse() {
                current.fps = fps;
            }
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            return Some(current.clone());
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_parsing() {
        let mut progress = FfmpegProgress::default();

        assert!(parse_progress_line("out_time_us=5000000", &mut progress).is_none());
        assert_eq!(progress.out_time_ms, 5000);

        parse_progress_line("speed=1.5x", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        parse_progress_line("speed=N/A", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        let snapshot = parse_progress_line("progress=end", &mut progress).unwrap();
        assert!(snapshot.is_complete);
        assert_eq!(snapshot.percentage(20_000), 100.0);
    }

    #[test]
    fn test_percentage_clamped() {
        let progress = FfmpegProgress {
            out_time_ms: 15_000,
            ..Default::default()
        };
        assert!((progress.percentage(30_000) - 50.0).abs() < 0.01);
        assert_eq!(progress.percentage(10_000), 100.0);
        assert_eq!(progress.percentage(0), 0.0);
    }

    #[test]
    fn test_callback_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback = Arc::new(move |event| {
            sink.lock().unwrap().push(event.percent);
        });

        callback(RenderProgress::new(150.0, "over"));
        callback(RenderProgress::new(40.0, "mid"));
        assert_eq!(*seen.lock().unwrap(), vec![100.0, 40.0]);
    }
}
