use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::downloader::{FetchJob, FetchPool};
use super::report::SyncReport;
use crate::catalog::model::Descriptor;
use crate::store::layout::library_path;

/// Ensures every dependency artifact a descriptor declares exists under the library root.
pub struct DependencySynchronizer {
    pool: Arc<FetchPool>,
    library_base_url: String,
    os_name: String,
}

impl DependencySynchronizer {
    pub fn new(
        pool: Arc<FetchPool>,
        library_base_url: impl Into<String>,
        os_name: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            library_base_url: library_base_url.into(),
            os_name: os_name.into(),
        }
    }

    pub async fn sync(&self, descriptor: &Descriptor, lib_root: &Path) -> SyncReport {
        let mut report = SyncReport {
            skipped: descriptor.metadata_only_libraries(),
            ..SyncReport::default()
        };
        let mut jobs = Vec::new();

        let entries =
            descriptor.dependency_entries(lib_root, &self.library_base_url, &self.os_name);
        for entry in entries {
            let Some(url) = entry.download_url else {
                debug!("{} has no download for {}, skipping", entry.name, self.os_name);
                report.skipped += 1;
                continue;
            };
            // Queued jobs are counted as attempted by the pool.
            let dest = match library_path(lib_root, &entry.relative_path) {
                Ok(dest) => dest,
                Err(e) => {
                    report.attempted += 1;
                    report.record_failure(entry.relative_path, None, e);
                    continue;
                }
            };
            if entry.present {
                report.attempted += 1;
                report.already_present += 1;
                continue;
            }
            jobs.push(FetchJob {
                key: entry.relative_path,
                url,
                dest,
            });
        }

        if !jobs.is_empty() {
            info!(
                "release {}: fetching {} missing libraries",
                descriptor.id,
                jobs.len()
            );
        }
        report.merge(self.pool.run(jobs).await);
        report
    }

    /// Ensure the release's own archive exists at `dest`.
    pub async fn sync_primary_archive(&self, descriptor: &Descriptor, dest: &Path) -> SyncReport {
        let Some(url) = descriptor.primary_archive_url() else {
            return SyncReport {
                skipped: 1,
                ..SyncReport::default()
            };
        };
        if dest.is_file() {
            return SyncReport {
                attempted: 1,
                already_present: 1,
                ..SyncReport::default()
            };
        }
        info!("release {}: fetching primary archive", descriptor.id);
        self.pool
            .run(vec![FetchJob {
                key: format!("{}.jar", descriptor.id),
                url: url.to_string(),
                dest: dest.to_path_buf(),
            }])
            .await
    }
}
