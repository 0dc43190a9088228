//! Render plan compilation and local FFmpeg rendering.
//!
//! This crate provides:
//! - The strategy compiler producing engine-agnostic render plans
//! - Timeline placement and numeric validation
//! - Plan to FFmpeg command translation, including manual command export
//! - Type-safe FFmpeg command building and a runner with timeout and cancellation
//! - Progress parsing from `-progress pipe:2`

pub mod command;
pub mod compiler;
pub mod error;
pub mod progress;
pub mod render;
pub mod timeline;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use compiler::{compile, CompileOptions};
pub use error::{MediaError, MediaResult};
pub use progress::{noop_progress, FfmpegProgress, ProgressCallback, RenderProgress};
pub use render::{local_path, manual_command, plan_command};
pub use timeline::{place_contiguously, status_for, validate_timeline};
