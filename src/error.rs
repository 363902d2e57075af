//! Error taxonomy for resolution, synchronization and launch.

use std::io;
use std::path::PathBuf;

/// Errors surfaced by the launcher core.
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    /// Connection, timeout or non-success HTTP status.
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The requested release id is absent from the catalog.
    #[error("unknown release: {release_id}")]
    NotFound { release_id: String },

    /// A directory could not be created or a file could not be read/written.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A metadata document could not be parsed.
    #[error("malformed {what}: {source}")]
    Document {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Input rejected before any work was done.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The child process could not be started.
    #[error("launch failed: {message}")]
    Launch { message: String },

    /// The child process exited inside the liveness window.
    #[error("process exited during startup ({status})")]
    ExitedEarly { status: String, log: String },

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

impl LauncherError {
    pub fn network(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn document(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Document {
            what: what.into(),
            source,
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Captured process output for [`LauncherError::ExitedEarly`].
    pub fn log_excerpt(&self) -> Option<&str> {
        match self {
            Self::ExitedEarly { log, .. } => Some(log),
            _ => None,
        }
    }
}

/// Result type for launcher operations.
pub type Result<T> = std::result::Result<T, LauncherError>;
