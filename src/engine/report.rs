use std::path::PathBuf;

/// One entry that could not be synchronized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// Relative artifact path or logical asset name.
    pub key: String,
    pub path: Option<PathBuf>,
    pub error: String,
}

/// Outcome counts of one synchronization pass.
///
/// `attempted == already_present + succeeded + failed.len() + cancelled`;
/// `skipped` counts entries without a download URL and is not part of `attempted`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub attempted: usize,
    pub skipped: usize,
    pub already_present: usize,
    pub succeeded: usize,
    pub cancelled: usize,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Every attempted entry is now on disk.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.cancelled == 0
    }

    pub fn is_failed(&self, key: &str) -> bool {
        self.failed.iter().any(|f| f.key == key)
    }

    pub fn record_failure(
        &mut self,
        key: impl Into<String>,
        path: Option<PathBuf>,
        error: impl ToString,
    ) {
        self.failed.push(SyncFailure {
            key: key.into(),
            path,
            error: error.to_string(),
        });
    }

    pub fn merge(&mut self, other: SyncReport) {
        self.attempted += other.attempted;
        self.skipped += other.skipped;
        self.already_present += other.already_present;
        self.succeeded += other.succeeded;
        self.cancelled += other.cancelled;
        self.failed.extend(other.failed);
    }
}
