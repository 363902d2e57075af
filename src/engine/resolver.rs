// Metadata resolution: local store first, network only on a miss.

use tracing::{debug, info};

use crate::catalog::client::CatalogClient;
use crate::catalog::model::{AssetIndex, Descriptor};
use crate::error::Result;
use crate::store::descriptor_store::DescriptorStore;
use crate::store::layout::validate_segment;

pub struct MetadataResolver {
    client: CatalogClient,
    store: DescriptorStore,
}

impl MetadataResolver {
    pub fn new(client: CatalogClient, store: DescriptorStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &DescriptorStore {
        &self.store
    }

    /// Load the descriptor for `release_id`, fetching and saving it on a miss.
    ///
    /// Once saved, later calls never reach the network for the same release.
    pub async fn ensure_descriptor(&self, release_id: &str) -> Result<Descriptor> {
        validate_segment("release id", release_id)?;
        if let Some(descriptor) = self.store.load(release_id)? {
            debug!("descriptor {} loaded from local store", release_id);
            return Ok(descriptor);
        }

        info!("descriptor {} not found locally, resolving from catalog", release_id);
        let descriptor = self.client.resolve(release_id).await?;
        self.store.save(release_id, &descriptor)?;
        Ok(descriptor)
    }

    /// Same policy as [`Self::ensure_descriptor`] for the descriptor's asset index.
    pub async fn ensure_asset_index(&self, descriptor: &Descriptor) -> Result<AssetIndex> {
        let index_ref = &descriptor.asset_index;
        validate_segment("asset index id", &index_ref.id)?;
        if let Some(index) = self.store.load_asset_index(&index_ref.id)? {
            debug!("asset index {} loaded from local store", index_ref.id);
            return Ok(index);
        }

        info!("asset index {} not found locally, fetching", index_ref.id);
        let index = self
            .client
            .fetch_asset_index(&index_ref.id, &index_ref.url)
            .await?;
        self.store.save_asset_index(&index)?;
        Ok(index)
    }
}
