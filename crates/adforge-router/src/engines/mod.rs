//! Engine backends.

mod dry_run;
mod ffmpeg;
mod http;

pub use dry_run::DryRunEngine;
pub use ffmpeg::FfmpegEngine;
pub use http::HttpEngine;
