use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Top-level catalog listing every published release.
pub const DEFAULT_CATALOG_URL: &str =
    "https://launchermeta.mojang.com/mc/game/version_manifest.json";

/// Base URL that dependency artifact paths are appended to.
pub const DEFAULT_LIBRARY_BASE_URL: &str = "https://libraries.minecraft.net";

/// Base URL that `hh/hash` asset object paths are appended to.
pub const DEFAULT_ASSET_BASE_URL: &str = "https://resources.download.minecraft.net";

/// Placeholder identity fields passed to the child when no real session exists.
pub const PLACEHOLDER_UUID: &str = "00000000-0000-0000-0000-000000000000";
pub const PLACEHOLDER_ACCESS_TOKEN: &str = "stellar-access-token";
pub const PLACEHOLDER_USER_TYPE: &str = "mojang";

/// Maximum number of trailing log bytes surfaced after a failed launch (64 KB).
pub const MAX_LOG_EXCERPT_BYTES: u64 = 64 * 1024;

/// Native jars shipped with every LWJGL 3 distribution the launcher supports.
pub const LWJGL_JARS: [&str; 7] = [
    "lwjgl.jar",
    "lwjgl-glfw.jar",
    "lwjgl-opengl.jar",
    "lwjgl-openal.jar",
    "lwjgl-stb.jar",
    "lwjgl-tinyfd.jar",
    "lwjgl-jemalloc.jar",
];

/// Top-level configuration for the launcher core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Root of the local store (`versions/`, `libraries/`, `assets/`).
    pub game_dir: PathBuf,
    pub catalog_url: String,
    pub library_base_url: String,
    pub asset_base_url: String,
    /// Number of concurrent fetch workers per synchronizer.
    pub max_concurrency: u32,
    /// Extra attempts per artifact after the first failure.
    pub max_retries: u32,
    /// Backoff unit between artifact retries; attempt `n` waits `n * backoff`.
    pub retry_backoff_ms: u64,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
    /// How long a freshly started process must survive to count as running.
    pub liveness_window_ms: u64,
    /// Log file receiving the child's output. Defaults to `<game_dir>/error_log.txt`.
    pub log_path: Option<PathBuf>,
    /// JVM arguments placed before the library path and classpath.
    pub jvm_args: Vec<String>,
    /// OS name matched against library platform rules (`windows`, `osx`, `linux`).
    pub os_name: String,
    pub runtimes: RuntimeTable,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            game_dir: PathBuf::from("data_minecraft"),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            library_base_url: DEFAULT_LIBRARY_BASE_URL.to_string(),
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
            max_concurrency: 8,
            max_retries: 2,
            retry_backoff_ms: 500,
            request_timeout_secs: 60,
            liveness_window_ms: 10_000,
            log_path: None,
            jvm_args: vec!["-Xmx2G".to_string(), "-Xms1G".to_string()],
            os_name: current_os_name().to_string(),
            runtimes: RuntimeTable::default(),
        }
    }
}

impl LauncherConfig {
    pub fn with_game_dir(game_dir: impl Into<PathBuf>) -> Self {
        Self {
            game_dir: game_dir.into(),
            ..Self::default()
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| self.game_dir.join("error_log.txt"))
    }

    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.liveness_window_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Java runtime and native library set used to start one release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuntimeProfile {
    /// Java executable. A bare name is resolved through `PATH`.
    pub java_path: PathBuf,
    /// Root of the native library distribution. Relative roots resolve against `game_dir`.
    pub native_root: PathBuf,
    /// Directory holding the platform's shared libraries, relative to `native_root`.
    pub native_dir: PathBuf,
    /// Jars appended to the end of the search path, relative to `native_root`.
    pub native_jars: Vec<PathBuf>,
}

impl RuntimeProfile {
    /// LWJGL 3.3.1 on a current Java runtime.
    pub fn lwjgl_331() -> Self {
        Self {
            java_path: PathBuf::from("java"),
            native_root: PathBuf::from("Natives/lwjgl-3.3.1"),
            native_dir: PathBuf::from(platform_native_dir("win-nat")),
            native_jars: LWJGL_JARS.iter().map(PathBuf::from).collect(),
        }
    }

    /// LWJGL 3.2.1 on Java 8, with jars kept under `jar/`.
    pub fn lwjgl_321() -> Self {
        Self {
            java_path: PathBuf::from("java"),
            native_root: PathBuf::from("Natives/lwjgl-3.2.1"),
            native_dir: PathBuf::from(platform_native_dir("win-natives")),
            native_jars: LWJGL_JARS
                .iter()
                .map(|jar| Path::new("jar").join(jar))
                .collect(),
        }
    }

    fn resolve_root(&self, game_dir: &Path) -> PathBuf {
        if self.native_root.is_absolute() {
            self.native_root.clone()
        } else {
            game_dir.join(&self.native_root)
        }
    }

    /// Absolute directory passed as the native library path.
    pub fn native_library_dir(&self, game_dir: &Path) -> PathBuf {
        self.resolve_root(game_dir).join(&self.native_dir)
    }

    /// Absolute locations of the supplementary jars, in declaration order.
    pub fn native_jar_paths(&self, game_dir: &Path) -> Vec<PathBuf> {
        let root = self.resolve_root(game_dir);
        self.native_jars.iter().map(|jar| root.join(jar)).collect()
    }
}

/// Release-specific runtime quirks, keyed by release id.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeTable {
    pub default: RuntimeProfile,
    pub overrides: HashMap<String, RuntimeProfile>,
}

impl Default for RuntimeTable {
    fn default() -> Self {
        let mut overrides = HashMap::new();
        overrides.insert("1.16.5".to_string(), RuntimeProfile::lwjgl_321());
        Self {
            default: RuntimeProfile::lwjgl_331(),
            overrides,
        }
    }
}

impl RuntimeTable {
    pub fn for_release(&self, release_id: &str) -> &RuntimeProfile {
        self.overrides.get(release_id).unwrap_or(&self.default)
    }
}

/// OS name in the vocabulary used by descriptor platform rules.
pub fn current_os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "osx",
        other => other,
    }
}

fn platform_native_dir(windows_dir: &str) -> &str {
    if cfg!(windows) {
        windows_dir
    } else {
        "natives"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LauncherConfig::with_game_dir("/tmp/game");
        assert_eq!(config.log_path(), PathBuf::from("/tmp/game/error_log.txt"));
        assert_eq!(config.liveness_window(), Duration::from_secs(10));
        assert_eq!(config.jvm_args, vec!["-Xmx2G", "-Xms1G"]);
    }

    #[test]
    fn test_runtime_lookup_falls_back_to_default() {
        let table = RuntimeTable::default();
        assert_eq!(table.for_release("1.20.4"), &RuntimeProfile::lwjgl_331());
        assert_eq!(table.for_release("1.16.5"), &RuntimeProfile::lwjgl_321());
    }

    #[test]
    fn test_native_paths_resolve_against_game_dir() {
        let profile = RuntimeProfile::lwjgl_321();
        let jars = profile.native_jar_paths(Path::new("/g"));
        assert_eq!(jars[0], PathBuf::from("/g/Natives/lwjgl-3.2.1/jar/lwjgl.jar"));

        let absolute = RuntimeProfile {
            native_root: PathBuf::from("/opt/lwjgl"),
            ..RuntimeProfile::lwjgl_331()
        };
        assert!(absolute
            .native_library_dir(Path::new("/g"))
            .starts_with("/opt/lwjgl"));
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: LauncherConfig =
            serde_json::from_str(r#"{"game_dir": "/srv/mc", "max_concurrency": 2}"#).unwrap();
        assert_eq!(config.game_dir, PathBuf::from("/srv/mc"));
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);
    }
}
