use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::downloader::{FetchJob, FetchPool};
use super::report::SyncReport;
use crate::catalog::model::AssetIndex;
use crate::store::layout::{object_key, object_path};

/// Ensures every object of an asset index exists in the content-addressed store.
pub struct AssetSynchronizer {
    pool: Arc<FetchPool>,
    asset_base_url: String,
}

impl AssetSynchronizer {
    pub fn new(pool: Arc<FetchPool>, asset_base_url: impl Into<String>) -> Self {
        Self {
            pool,
            asset_base_url: asset_base_url.into(),
        }
    }

    /// Objects are counted once per distinct hash; names sharing a hash share a file.
    pub async fn sync(&self, index: &AssetIndex, objects_root: &Path) -> SyncReport {
        let base = self.asset_base_url.trim_end_matches('/');
        let mut report = SyncReport::default();
        let mut seen = HashSet::new();
        let mut jobs = Vec::new();

        for (name, object) in &index.objects {
            if !seen.insert(object.hash.as_str()) {
                continue;
            }
            let (key, dest) = match object_key(&object.hash)
                .and_then(|key| Ok((key, object_path(objects_root, &object.hash)?)))
            {
                Ok(resolved) => resolved,
                Err(e) => {
                    report.attempted += 1;
                    report.record_failure(name.clone(), None, e);
                    continue;
                }
            };
            if dest.is_file() {
                report.attempted += 1;
                report.already_present += 1;
                continue;
            }
            jobs.push(FetchJob {
                key: name.clone(),
                url: format!("{}/{}", base, key),
                dest,
            });
        }

        if !jobs.is_empty() {
            info!(
                "asset index {}: fetching {} of {} objects",
                index.id,
                jobs.len(),
                seen.len()
            );
        }
        report.merge(self.pool.run(jobs).await);
        report
    }
}
