//! Loading input documents from disk.

use std::path::Path;

use adforge_models::{
    parse_analyzed_video, parse_blueprint, AnalyzedVideo, CreativeBlueprint, HistoricalOutcome,
};

use crate::error::{WorkerError, WorkerResult};

fn read(path: &Path) -> WorkerResult<String> {
    std::fs::read_to_string(path).map_err(|source| WorkerError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and validate an analyzed video document.
pub fn load_analysis(path: impl AsRef<Path>) -> WorkerResult<AnalyzedVideo> {
    Ok(parse_analyzed_video(&read(path.as_ref())?)?)
}

/// Read and validate a creative blueprint document.
pub fn load_blueprint(path: impl AsRef<Path>) -> WorkerResult<CreativeBlueprint> {
    Ok(parse_blueprint(&read(path.as_ref())?)?)
}

/// Read a JSON array of past framework outcomes.
pub fn load_history(path: impl AsRef<Path>) -> WorkerResult<Vec<HistoricalOutcome>> {
    Ok(serde_json::from_str(&read(path.as_ref())?)?)
}
