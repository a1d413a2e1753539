use std::io;

use thiserror::Error;

/// Failures of a landmark source.  None of them stop the main loop: a
/// failed source simply stops publishing detections.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to start detector {command:?}: {source}")]
    Spawn { command: String, source: io::Error },

    #[error("detector produced no stdout handle")]
    NoStdout,

    #[error("reading detector output: {0}")]
    Read(#[from] io::Error),

    #[error("malformed detection on line {line}: {source}")]
    Parse { line: u64, source: serde_json::Error },

    #[error("landmark source disconnected")]
    Disconnected,

    #[error("tracking device: {0}")]
    Device(String),
}
