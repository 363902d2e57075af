// Launch assembly: search path and argument vector for one release.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::model::Descriptor;
use crate::config::{
    LauncherConfig, PLACEHOLDER_ACCESS_TOKEN, PLACEHOLDER_USER_TYPE, PLACEHOLDER_UUID,
};
use crate::error::{LauncherError, Result};

/// Player identity passed to the child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub uuid: String,
    pub access_token: String,
    pub user_type: String,
}

impl Identity {
    /// A user name with placeholder session fields.
    pub fn offline(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            uuid: PLACEHOLDER_UUID.to_string(),
            access_token: PLACEHOLDER_ACCESS_TOKEN.to_string(),
            user_type: PLACEHOLDER_USER_TYPE.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(LauncherError::Validation(
                "user name must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything needed to start a release. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub jvm_args: Vec<String>,
    pub native_dir: PathBuf,
    /// Dependencies, then the primary archive, then supplementary native jars.
    pub search_path: Vec<PathBuf>,
    pub entry_point: String,
    pub game_args: Vec<String>,
    pub working_dir: PathBuf,
    pub log_path: PathBuf,
}

impl LaunchSpec {
    /// Full argument vector, excluding the program itself.
    pub fn arguments(&self) -> Result<Vec<OsString>> {
        let classpath =
            std::env::join_paths(&self.search_path).map_err(|e| LauncherError::Launch {
                message: format!("search path cannot be joined: {}", e),
            })?;

        let mut library_path = OsString::from("-Djava.library.path=");
        library_path.push(&self.native_dir);

        let mut args: Vec<OsString> = self.jvm_args.iter().map(OsString::from).collect();
        args.push(library_path);
        args.push("-cp".into());
        args.push(classpath);
        args.push(OsString::from(&self.entry_point));
        args.extend(self.game_args.iter().map(OsString::from));
        Ok(args)
    }
}

pub struct LaunchAssembler {
    config: LauncherConfig,
}

impl LaunchAssembler {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    /// Build the launch invocation for `descriptor`.
    ///
    /// Dependencies missing from `lib_root` are left off the search path.
    pub fn assemble(
        &self,
        descriptor: &Descriptor,
        lib_root: &Path,
        release_dir: &Path,
        assets_dir: &Path,
        asset_index_id: &str,
        identity: &Identity,
    ) -> Result<LaunchSpec> {
        identity.validate()?;

        let game_dir = &self.config.game_dir;
        let profile = self.config.runtimes.for_release(&descriptor.id);

        let entries = descriptor.dependency_entries(
            lib_root,
            &self.config.library_base_url,
            &self.config.os_name,
        );
        let total = entries.len();
        let mut search_path: Vec<PathBuf> = entries
            .into_iter()
            .filter(|e| e.present)
            .map(|e| e.local_path)
            .collect();
        if search_path.len() < total {
            debug!(
                "release {}: {} of {} libraries absent from the search path",
                descriptor.id,
                total - search_path.len(),
                total
            );
        }
        search_path.push(release_dir.join(format!("{}.jar", descriptor.id)));
        search_path.extend(profile.native_jar_paths(game_dir));

        let game_args = vec![
            "--username".to_string(),
            identity.username.clone(),
            "--version".to_string(),
            descriptor.id.clone(),
            "--gameDir".to_string(),
            game_dir.display().to_string(),
            "--assetsDir".to_string(),
            assets_dir.display().to_string(),
            "--assetIndex".to_string(),
            asset_index_id.to_string(),
            "--uuid".to_string(),
            identity.uuid.clone(),
            "--accessToken".to_string(),
            identity.access_token.clone(),
            "--userType".to_string(),
            identity.user_type.clone(),
        ];

        Ok(LaunchSpec {
            program: profile.java_path.clone(),
            jvm_args: self.config.jvm_args.clone(),
            native_dir: profile.native_library_dir(game_dir),
            search_path,
            entry_point: descriptor.main_class.clone(),
            game_args,
            working_dir: game_dir.clone(),
            log_path: self.config.log_path(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use bytes::Bytes;

    use super::*;
    use crate::config::RuntimeProfile;

    const DESCRIPTOR: &str = r#"{
        "id": "1.20.4",
        "mainClass": "net.minecraft.client.main.Main",
        "assetIndex": {"id": "12", "url": "u"},
        "libraries": [
            {"downloads": {"artifact": {"path": "org/a/a-1.jar", "url": ""}}},
            {"downloads": {"artifact": {"path": "org/b/b-1.jar", "url": ""}}},
            {"downloads": {"artifact": {"path": "org/c/c-1.jar", "url": ""}}}
        ]
    }"#;

    fn setup() -> (tempfile::TempDir, LaunchAssembler, Descriptor) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LauncherConfig::with_game_dir(dir.path());
        config.runtimes.default = RuntimeProfile {
            java_path: PathBuf::from("java"),
            native_root: PathBuf::from("natives"),
            native_dir: PathBuf::from("bin"),
            native_jars: vec![PathBuf::from("lwjgl.jar"), PathBuf::from("lwjgl-glfw.jar")],
        };
        let lib_root = dir.path().join("libraries");
        for rel in ["org/a/a-1.jar", "org/c/c-1.jar"] {
            let p = lib_root.join(rel);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, b"jar").unwrap();
        }
        let descriptor = Descriptor::from_slice(Bytes::from_static(DESCRIPTOR.as_bytes())).unwrap();
        (dir, LaunchAssembler::new(config), descriptor)
    }

    #[test]
    fn test_search_path_order() {
        let (dir, assembler, descriptor) = setup();
        let root = dir.path();
        let spec = assembler
            .assemble(
                &descriptor,
                &root.join("libraries"),
                &root.join("versions/1.20.4"),
                &root.join("assets"),
                "12",
                &Identity::offline("Steve"),
            )
            .unwrap();

        assert_eq!(
            spec.search_path,
            vec![
                root.join("libraries/org/a/a-1.jar"),
                root.join("libraries/org/c/c-1.jar"),
                root.join("versions/1.20.4/1.20.4.jar"),
                root.join("natives/lwjgl.jar"),
                root.join("natives/lwjgl-glfw.jar"),
            ]
        );
        assert_eq!(spec.native_dir, root.join("natives/bin"));
        assert_eq!(spec.entry_point, "net.minecraft.client.main.Main");
    }

    #[test]
    fn test_arguments_layout() {
        let (dir, assembler, descriptor) = setup();
        let root = dir.path();
        let spec = assembler
            .assemble(
                &descriptor,
                &root.join("libraries"),
                &root.join("versions/1.20.4"),
                &root.join("assets"),
                "12",
                &Identity::offline("Steve"),
            )
            .unwrap();
        let args: Vec<String> = spec
            .arguments()
            .unwrap()
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();

        assert_eq!(&args[..2], &["-Xmx2G", "-Xms1G"]);
        assert!(args[2].starts_with("-Djava.library.path="));
        assert_eq!(args[3], "-cp");
        assert_eq!(args[5], "net.minecraft.client.main.Main");
        let tail = &args[6..];
        assert_eq!(tail[0..2], ["--username", "Steve"]);
        assert_eq!(tail[2..4], ["--version", "1.20.4"]);
        assert_eq!(tail[8..10], ["--assetIndex", "12"]);
        assert_eq!(tail[10..12], ["--uuid", PLACEHOLDER_UUID]);
        assert_eq!(tail[12..14], ["--accessToken", PLACEHOLDER_ACCESS_TOKEN]);
        assert_eq!(tail[14..16], ["--userType", PLACEHOLDER_USER_TYPE]);
    }

    #[test]
    fn test_blank_identity_rejected() {
        let (dir, assembler, descriptor) = setup();
        let root = dir.path();
        let err = assembler
            .assemble(
                &descriptor,
                &root.join("libraries"),
                &root.join("versions/1.20.4"),
                &root.join("assets"),
                "12",
                &Identity::offline("   "),
            )
            .unwrap_err();
        assert!(matches!(err, LauncherError::Validation(_)));
    }
}
