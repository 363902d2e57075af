// On-disk layout of the local store rooted at the game directory.

use std::path::{Component, Path, PathBuf};

use crate::error::{LauncherError, Result};

#[derive(Debug, Clone)]
pub struct LocalStore {
    game_dir: PathBuf,
}

impl LocalStore {
    pub fn new(game_dir: impl Into<PathBuf>) -> Self {
        Self {
            game_dir: game_dir.into(),
        }
    }

    pub fn game_dir(&self) -> &Path {
        &self.game_dir
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.game_dir.join("versions")
    }

    /// `versions/<id>/`
    pub fn release_dir(&self, release_id: &str) -> PathBuf {
        self.versions_dir().join(release_id)
    }

    /// `versions/<id>/<id>.json`
    pub fn descriptor_path(&self, release_id: &str) -> PathBuf {
        self.release_dir(release_id)
            .join(format!("{}.json", release_id))
    }

    /// `versions/<id>/<id>.jar`
    pub fn primary_archive_path(&self, release_id: &str) -> PathBuf {
        self.release_dir(release_id)
            .join(format!("{}.jar", release_id))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.game_dir.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.game_dir.join("assets")
    }

    /// `assets/indexes/<id>.json`
    pub fn asset_index_path(&self, asset_index_id: &str) -> PathBuf {
        self.assets_dir()
            .join("indexes")
            .join(format!("{}.json", asset_index_id))
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.assets_dir().join("objects")
    }
}

/// Reject ids that would escape their directory when used as a path segment.
pub fn validate_segment(kind: &str, id: &str) -> Result<()> {
    let valid = !id.trim().is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
        && !id.contains('\0');
    if valid {
        Ok(())
    } else {
        Err(LauncherError::Validation(format!("invalid {}: {:?}", kind, id)))
    }
}

/// `<lib_root>/<relative_path>`, rejecting absolute paths and `..` components.
pub fn library_path(lib_root: &Path, relative_path: &str) -> Result<PathBuf> {
    let rel = Path::new(relative_path);
    let contained = !relative_path.is_empty()
        && rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
        return Err(LauncherError::Validation(format!(
            "artifact path escapes library root: {:?}",
            relative_path
        )));
    }
    Ok(lib_root.join(rel))
}

/// `hh/hash` for a content hash, shared by the local layout and the remote endpoint.
pub fn object_key(hash: &str) -> Result<String> {
    if hash.len() < 2 || !hash.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(LauncherError::Validation(format!(
            "malformed object hash: {:?}",
            hash
        )));
    }
    Ok(format!("{}/{}", &hash[..2], hash))
}

/// `<objects_root>/<hash[0:2]>/<hash>`
pub fn object_path(objects_root: &Path, hash: &str) -> Result<PathBuf> {
    object_key(hash)?;
    Ok(objects_root.join(&hash[..2]).join(hash))
}
