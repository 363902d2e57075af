use std::sync::Arc;

use tracing::{debug, info, warn};

use super::model::{AssetIndex, Catalog, Descriptor};
use crate::error::{LauncherError, Result};
use crate::source::traits::RemoteSource;

/// Fetches the release catalog and per-release metadata. Never caches.
pub struct CatalogClient {
    source: Arc<dyn RemoteSource>,
    catalog_url: String,
}

impl CatalogClient {
    pub fn new(source: Arc<dyn RemoteSource>, catalog_url: impl Into<String>) -> Self {
        Self {
            source,
            catalog_url: catalog_url.into(),
        }
    }

    pub async fn fetch_catalog(&self) -> Result<Catalog> {
        let bytes = self
            .source
            .fetch(&self.catalog_url)
            .await
            .map_err(|e| LauncherError::network(&self.catalog_url, format!("{:#}", e)))?;
        let catalog = Catalog::from_slice(&bytes)?;
        debug!("catalog fetched: {} releases", catalog.versions.len());
        Ok(catalog)
    }

    pub async fn fetch_descriptor(&self, descriptor_url: &str) -> Result<Descriptor> {
        let bytes = self
            .source
            .fetch(descriptor_url)
            .await
            .map_err(|e| LauncherError::network(descriptor_url, format!("{:#}", e)))?;
        Descriptor::from_slice(bytes)
    }

    pub async fn fetch_asset_index(&self, id: &str, url: &str) -> Result<AssetIndex> {
        let bytes = self
            .source
            .fetch(url)
            .await
            .map_err(|e| LauncherError::network(url, format!("{:#}", e)))?;
        AssetIndex::from_slice(id, bytes)
    }

    /// Look `release_id` up in a freshly fetched catalog and fetch its descriptor.
    pub async fn resolve(&self, release_id: &str) -> Result<Descriptor> {
        let catalog = self.fetch_catalog().await?;
        let Some(entry) = catalog.find(release_id) else {
            warn!("release {} not present in catalog", release_id);
            return Err(LauncherError::NotFound {
                release_id: release_id.to_string(),
            });
        };

        let descriptor = self.fetch_descriptor(&entry.url).await?;
        if descriptor.id != release_id {
            return Err(LauncherError::Validation(format!(
                "descriptor at {} describes {}, expected {}",
                entry.url, descriptor.id, release_id
            )));
        }
        info!("release {} resolved from {}", release_id, entry.url);
        Ok(descriptor)
    }
}
