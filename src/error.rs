use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by the conversation source collaborators.
///
/// None of these are fatal: the poller treats them as "no change this cycle" and the
/// viewer keeps showing the last good state.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid conversation id: {0}")]
    InvalidId(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),
}
