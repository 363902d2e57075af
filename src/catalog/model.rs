// Metadata documents served by the distribution service.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Deserialize;

use crate::error::{LauncherError, Result};
use crate::store::layout::library_path;

/// Top-level manifest listing every available release.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub latest: Option<LatestReleases>,
    pub versions: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestReleases {
    pub release: String,
    pub snapshot: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Location of the release's descriptor document.
    pub url: String,
}

impl Catalog {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| LauncherError::document("catalog", e))
    }

    pub fn find(&self, release_id: &str) -> Option<&CatalogEntry> {
        self.versions.iter().find(|v| v.id == release_id)
    }
}

/// Per-release metadata: entry point, dependencies, asset index and primary archive.
///
/// The fetched bytes are retained so the local copy is written verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct Descriptor {
    pub id: String,
    #[serde(rename = "mainClass")]
    pub main_class: String,
    #[serde(default)]
    pub downloads: ReleaseDownloads,
    #[serde(rename = "assetIndex")]
    pub asset_index: AssetIndexRef,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(skip)]
    raw: Bytes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseDownloads {
    #[serde(default)]
    pub client: Option<RemoteFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    pub url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<Artifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub path: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl Library {
    pub fn artifact(&self) -> Option<&Artifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// Evaluate platform rules; the last matching rule wins and an empty list allows.
    pub fn applies_to(&self, os_name: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        let mut allowed = false;
        for rule in &self.rules {
            let matches = rule
                .os
                .as_ref()
                .and_then(|os| os.name.as_deref())
                .map_or(true, |name| name == os_name);
            if matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }
        allowed
    }

    fn display_name(&self, artifact: &Artifact) -> String {
        self.name.clone().unwrap_or_else(|| artifact.path.clone())
    }
}

/// A single artifact a release needs on its search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub name: String,
    pub relative_path: String,
    /// `None` when the library is excluded on this platform.
    pub download_url: Option<String>,
    pub local_path: PathBuf,
    /// A file exists at `local_path` and the path stays inside the library root.
    pub present: bool,
}

impl Descriptor {
    pub fn from_slice(bytes: Bytes) -> Result<Self> {
        let mut descriptor: Self = serde_json::from_slice(&bytes)
            .map_err(|e| LauncherError::document("release descriptor", e))?;
        descriptor.raw = bytes;
        Ok(descriptor)
    }

    /// The exact document this descriptor was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn primary_archive_url(&self) -> Option<&str> {
        self.downloads
            .client
            .as_ref()
            .map(|c| c.url.as_str())
            .filter(|url| !url.is_empty())
    }

    /// Project libraries that declare an artifact into dependency entries, in
    /// declaration order, once per relative path.
    ///
    /// Artifacts are fetched from `library_base_url` joined with their relative
    /// path; the declared URL is used only when no base is configured. When a
    /// path is declared more than once, a later declaration that applies to
    /// `os_name` replaces an earlier one that does not.
    pub fn dependency_entries(
        &self,
        lib_root: &Path,
        library_base_url: &str,
        os_name: &str,
    ) -> Vec<DependencyEntry> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut entries: Vec<DependencyEntry> = Vec::new();
        for library in &self.libraries {
            let Some(artifact) = library.artifact() else {
                continue;
            };
            let download_url = if !library.applies_to(os_name) {
                None
            } else if !library_base_url.is_empty() {
                Some(format!(
                    "{}/{}",
                    library_base_url.trim_end_matches('/'),
                    artifact.path
                ))
            } else if !artifact.url.is_empty() {
                Some(artifact.url.clone())
            } else {
                None
            };

            if let Some(&index) = seen.get(artifact.path.as_str()) {
                let existing = &mut entries[index];
                if existing.download_url.is_none() && download_url.is_some() {
                    existing.name = library.display_name(artifact);
                    existing.download_url = download_url;
                }
                continue;
            }

            let (local_path, present) = match library_path(lib_root, &artifact.path) {
                Ok(path) => {
                    let present = path.is_file();
                    (path, present)
                }
                Err(_) => (lib_root.join(&artifact.path), false),
            };
            seen.insert(artifact.path.as_str(), entries.len());
            entries.push(DependencyEntry {
                name: library.display_name(artifact),
                relative_path: artifact.path.clone(),
                download_url,
                local_path,
                present,
            });
        }
        entries
    }

    /// Libraries that declare no artifact at all (metadata-only entries).
    pub fn metadata_only_libraries(&self) -> usize {
        self.libraries
            .iter()
            .filter(|l| l.artifact().is_none())
            .count()
    }
}

/// Mapping from logical asset name to content-addressed object.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndex {
    #[serde(skip)]
    pub id: String,
    pub objects: HashMap<String, AssetObject>,
    #[serde(skip)]
    raw: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    #[serde(default)]
    pub size: u64,
}

impl AssetIndex {
    pub fn from_slice(id: &str, bytes: Bytes) -> Result<Self> {
        let mut index: Self = serde_json::from_slice(&bytes)
            .map_err(|e| LauncherError::document(format!("asset index {}", id), e))?;
        index.id = id.to_string();
        index.raw = bytes;
        Ok(index)
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"{
        "id": "1.20.4",
        "mainClass": "net.minecraft.client.main.Main",
        "downloads": {"client": {"url": "https://piston/client.jar", "size": 10}},
        "assetIndex": {"id": "12", "url": "https://piston/12.json"},
        "libraries": [
            {"name": "org.x:lib:1.0", "downloads": {"artifact": {"path": "org/x/lib-1.0.jar", "url": "https://declared/org/x/lib-1.0.jar"}}},
            {"name": "org.x:lib:1.0", "downloads": {"artifact": {"path": "org/x/lib-1.0.jar", "url": "https://declared/org/x/lib-1.0.jar"}}},
            {"name": "org.mac:only:1", "downloads": {"artifact": {"path": "org/mac/only-1.jar", "url": ""}},
             "rules": [{"action": "allow", "os": {"name": "osx"}}]},
            {"name": "org.natives:meta:1"}
        ]
    }"#;

    fn descriptor() -> Descriptor {
        Descriptor::from_slice(Bytes::from_static(DESCRIPTOR.as_bytes())).unwrap()
    }

    #[test]
    fn test_descriptor_keeps_raw_bytes() {
        let d = descriptor();
        assert_eq!(d.id, "1.20.4");
        assert_eq!(d.raw(), DESCRIPTOR.as_bytes());
        assert_eq!(d.primary_archive_url(), Some("https://piston/client.jar"));
        assert_eq!(d.metadata_only_libraries(), 1);
    }

    #[test]
    fn test_dependency_entries_dedup_and_rules() {
        let d = descriptor();
        let entries = d.dependency_entries(Path::new("/lib"), "https://libs/", "linux");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].local_path, PathBuf::from("/lib/org/x/lib-1.0.jar"));
        assert_eq!(
            entries[0].download_url.as_deref(),
            Some("https://libs/org/x/lib-1.0.jar")
        );
        assert_eq!(entries[1].download_url, None);

        let on_mac = d.dependency_entries(Path::new("/lib"), "https://libs", "osx");
        assert!(on_mac[1].download_url.is_some());
    }

    #[test]
    fn test_later_applicable_duplicate_wins() {
        let d = Descriptor::from_slice(Bytes::from_static(
            br#"{
                "id": "1.20.4",
                "mainClass": "a.Main",
                "assetIndex": {"id": "12", "url": "u"},
                "libraries": [
                    {"name": "org.p:p:1:mac", "downloads": {"artifact": {"path": "org/p/p-1.jar", "url": ""}},
                     "rules": [{"action": "allow", "os": {"name": "osx"}}]},
                    {"name": "org.p:p:1", "downloads": {"artifact": {"path": "org/p/p-1.jar", "url": ""}}},
                    {"name": "org.p:p:1:again", "downloads": {"artifact": {"path": "org/p/p-1.jar", "url": ""}},
                     "rules": [{"action": "allow", "os": {"name": "osx"}}]}
                ]
            }"#,
        ))
        .unwrap();

        let entries = d.dependency_entries(Path::new("/lib"), "https://libs", "linux");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "org.p:p:1");
        assert_eq!(
            entries[0].download_url.as_deref(),
            Some("https://libs/org/p/p-1.jar")
        );
    }

    #[test]
    fn test_declared_url_used_without_base() {
        let entries = descriptor().dependency_entries(Path::new("/lib"), "", "linux");
        assert_eq!(
            entries[0].download_url.as_deref(),
            Some("https://declared/org/x/lib-1.0.jar")
        );
    }

    #[test]
    fn test_rules_last_match_wins() {
        let lib: Library = serde_json::from_str(
            r#"{"rules": [{"action": "allow"}, {"action": "disallow", "os": {"name": "osx"}}]}"#,
        )
        .unwrap();
        assert!(lib.applies_to("windows"));
        assert!(!lib.applies_to("osx"));
    }

    #[test]
    fn test_malformed_descriptor_is_document_error() {
        let err = Descriptor::from_slice(Bytes::from_static(b"{\"id\": 1}")).unwrap_err();
        assert!(matches!(err, LauncherError::Document { .. }));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = Catalog::from_slice(
            br#"{"latest": {"release": "1.20.4", "snapshot": "24w01a"},
                 "versions": [{"id": "1.20.4", "type": "release", "url": "https://m/1.20.4.json"}]}"#,
        )
        .unwrap();
        assert_eq!(catalog.find("1.20.4").unwrap().url, "https://m/1.20.4.json");
        assert!(catalog.find("9.9.9").is_none());
    }
}
