// Release launcher: metadata, content synchronization and process start.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::client::CatalogClient;
use crate::catalog::model::{AssetIndex, Descriptor};
use crate::config::LauncherConfig;
use crate::engine::assets::AssetSynchronizer;
use crate::engine::dependencies::DependencySynchronizer;
use crate::engine::downloader::FetchPool;
use crate::engine::report::SyncReport;
use crate::engine::resolver::MetadataResolver;
use crate::engine::stats::{ProgressSnapshot, SyncProgress};
use crate::error::{LauncherError, Result};
use crate::launch::assembler::{Identity, LaunchAssembler, LaunchSpec};
use crate::launch::process::{self, LaunchHandle};
use crate::source::http_source::HttpSource;
use crate::source::traits::RemoteSource;
use crate::store::descriptor_store::DescriptorStore;
use crate::store::layout::LocalStore;

/// A release whose metadata is cached and whose content has been synchronized.
#[derive(Debug, Clone)]
pub struct PreparedRelease {
    pub descriptor: Descriptor,
    pub asset_index: AssetIndex,
    pub primary_archive: SyncReport,
    pub dependencies: SyncReport,
    pub assets: SyncReport,
}

impl PreparedRelease {
    pub fn is_complete(&self) -> bool {
        self.primary_archive.is_complete()
            && self.dependencies.is_complete()
            && self.assets.is_complete()
    }
}

pub struct Launcher {
    config: LauncherConfig,
    layout: LocalStore,
    resolver: MetadataResolver,
    dependencies: DependencySynchronizer,
    assets: AssetSynchronizer,
    assembler: LaunchAssembler,
    progress: Arc<SyncProgress>,
    cancel: CancellationToken,
}

impl Launcher {
    /// Launcher backed by the HTTP distribution service.
    pub fn new(config: LauncherConfig) -> Result<Self> {
        let source = HttpSource::new(config.request_timeout())
            .map_err(|e| LauncherError::network(&config.catalog_url, format!("{:#}", e)))?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    pub fn with_source(config: LauncherConfig, source: Arc<dyn RemoteSource>) -> Self {
        let layout = LocalStore::new(config.game_dir.clone());
        let progress = Arc::new(SyncProgress::new());
        let cancel = CancellationToken::new();

        let pool = Arc::new(
            FetchPool::new(source.clone(), config.max_concurrency, progress.clone())
                .with_retry(config.max_retries, config.retry_backoff())
                .with_cancellation(cancel.clone()),
        );

        let resolver = MetadataResolver::new(
            CatalogClient::new(source, config.catalog_url.clone()),
            DescriptorStore::new(layout.clone()),
        );
        let dependencies = DependencySynchronizer::new(
            pool.clone(),
            config.library_base_url.clone(),
            config.os_name.clone(),
        );
        let assets = AssetSynchronizer::new(pool, config.asset_base_url.clone());
        let assembler = LaunchAssembler::new(config.clone());

        Self {
            config,
            layout,
            resolver,
            dependencies,
            assets,
            assembler,
            progress,
            cancel,
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn layout(&self) -> &LocalStore {
        &self.layout
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    /// Token shared by every fetch this launcher issues.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop issuing fetches. Permanent for this launcher.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn ensure_descriptor(&self, release_id: &str) -> Result<Descriptor> {
        self.resolver.ensure_descriptor(release_id).await
    }

    /// Resolve metadata and synchronize the primary archive, libraries and assets.
    ///
    /// Per-file failures are reported, not raised; metadata failures are raised.
    pub async fn prepare(&self, release_id: &str) -> Result<PreparedRelease> {
        let descriptor = self.resolver.ensure_descriptor(release_id).await?;
        let asset_index = self.resolver.ensure_asset_index(&descriptor).await?;
        if self.cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        let archive_path = self.layout.primary_archive_path(&descriptor.id);
        let lib_root = self.layout.libraries_dir();
        let objects_root = self.layout.objects_dir();
        let (primary_archive, dependencies, assets) = tokio::join!(
            self.dependencies.sync_primary_archive(&descriptor, &archive_path),
            self.dependencies.sync(&descriptor, &lib_root),
            self.assets.sync(&asset_index, &objects_root),
        );

        if self.cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        info!(
            "release {} prepared: libraries {}/{} assets {}/{}",
            descriptor.id,
            dependencies.already_present + dependencies.succeeded,
            dependencies.attempted,
            assets.already_present + assets.succeeded,
            assets.attempted
        );
        for failure in dependencies.failed.iter().chain(&assets.failed) {
            warn!("not synchronized: {} ({})", failure.key, failure.error);
        }

        Ok(PreparedRelease {
            descriptor,
            asset_index,
            primary_archive,
            dependencies,
            assets,
        })
    }

    pub fn assemble(&self, prepared: &PreparedRelease, identity: &Identity) -> Result<LaunchSpec> {
        self.assembler.assemble(
            &prepared.descriptor,
            &self.layout.libraries_dir(),
            &self.layout.release_dir(&prepared.descriptor.id),
            &self.layout.assets_dir(),
            &prepared.asset_index.id,
            identity,
        )
    }

    /// Prepare `release_id` and start it as `identity`.
    pub async fn launch(&self, release_id: &str, identity: &Identity) -> Result<LaunchHandle> {
        identity.validate()?;
        let prepared = self.prepare(release_id).await?;

        if let Some(failure) = prepared.primary_archive.failed.first() {
            return Err(LauncherError::Launch {
                message: format!("primary archive unavailable: {}", failure.error),
            });
        }

        let spec = self.assemble(&prepared, identity)?;
        process::launch(&spec, self.config.liveness_window()).await
    }
}
