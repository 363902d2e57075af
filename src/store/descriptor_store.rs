use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use super::atomic::write_atomic;
use super::layout::{validate_segment, LocalStore};
use crate::catalog::model::{AssetIndex, Descriptor};
use crate::error::{LauncherError, Result};

/// Locally cached descriptors and asset indexes. Purely filesystem-backed.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    layout: LocalStore,
}

impl DescriptorStore {
    pub fn new(layout: LocalStore) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LocalStore {
        &self.layout
    }

    /// Read `versions/<id>/<id>.json` if it exists.
    pub fn load(&self, release_id: &str) -> Result<Option<Descriptor>> {
        validate_segment("release id", release_id)?;
        let path = self.layout.descriptor_path(release_id);
        match read_if_present(&path)? {
            Some(bytes) => Descriptor::from_slice(bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Persist the descriptor verbatim as `versions/<release_id>/<release_id>.json`.
    pub fn save(&self, release_id: &str, descriptor: &Descriptor) -> Result<()> {
        validate_segment("release id", release_id)?;
        let path = self.layout.descriptor_path(release_id);
        write_atomic(&path, descriptor.raw())?;
        debug!("descriptor {} saved to {}", release_id, path.display());
        Ok(())
    }

    pub fn load_asset_index(&self, asset_index_id: &str) -> Result<Option<AssetIndex>> {
        validate_segment("asset index id", asset_index_id)?;
        let path = self.layout.asset_index_path(asset_index_id);
        match read_if_present(&path)? {
            Some(bytes) => AssetIndex::from_slice(asset_index_id, bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn save_asset_index(&self, index: &AssetIndex) -> Result<()> {
        validate_segment("asset index id", &index.id)?;
        let path = self.layout.asset_index_path(&index.id);
        write_atomic(&path, index.raw())?;
        debug!("asset index {} saved to {}", index.id, path.display());
        Ok(())
    }
}

fn read_if_present(path: &Path) -> Result<Option<Bytes>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(Bytes::from(bytes))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(LauncherError::filesystem(path, e)),
    }
}
