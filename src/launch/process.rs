// Child process start-up: redirected output and a bounded liveness check.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{info, warn};

use super::assembler::LaunchSpec;
use crate::config::MAX_LOG_EXCERPT_BYTES;
use crate::error::{LauncherError, Result};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// A process that survived the liveness window. Not supervised further.
#[derive(Debug)]
pub struct LaunchHandle {
    child: Child,
    log_path: PathBuf,
}

impl LaunchHandle {
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Non-blocking exit check.
    pub fn try_status(&mut self) -> Result<Option<ExitStatus>> {
        self.child.try_wait().map_err(|e| LauncherError::Launch {
            message: format!("could not query process state: {}", e),
        })
    }

    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await.map_err(|e| LauncherError::Launch {
            message: format!("could not stop process: {}", e),
        })
    }

    pub fn into_child(self) -> Child {
        self.child
    }
}

/// Start the process described by `spec` and wait up to `liveness_window` for it to exit.
///
/// Exiting inside the window is a failure carrying the tail of the log file;
/// otherwise the running process is handed back.
pub async fn launch(spec: &LaunchSpec, liveness_window: Duration) -> Result<LaunchHandle> {
    preflight(spec)?;
    let args = spec.arguments()?;

    if let Some(parent) = spec.log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LauncherError::filesystem(parent, e))?;
    }
    // Truncates any log left by a previous launch.
    let stdout_log = File::create(&spec.log_path)
        .map_err(|e| LauncherError::filesystem(&spec.log_path, e))?;
    let stderr_log = stdout_log
        .try_clone()
        .map_err(|e| LauncherError::filesystem(&spec.log_path, e))?;

    let mut cmd = Command::new(&spec.program);
    cmd.args(&args)
        .current_dir(&spec.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_log))
        .stderr(Stdio::from(stderr_log));
    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    info!(
        "starting {} {} ({} search path entries)",
        spec.program.display(),
        spec.entry_point,
        spec.search_path.len()
    );
    let mut child = cmd.spawn().map_err(|e| LauncherError::Launch {
        message: format!("could not start {}: {}", spec.program.display(), e),
    })?;
    let pid = child.id();

    match tokio::time::timeout(liveness_window, child.wait()).await {
        Ok(Ok(status)) => {
            let log = read_log_excerpt(&spec.log_path);
            warn!("process {:?} exited during startup: {}", pid, status);
            Err(LauncherError::ExitedEarly {
                status: status.to_string(),
                log,
            })
        }
        Ok(Err(e)) => Err(LauncherError::Launch {
            message: format!("could not observe process {:?}: {}", pid, e),
        }),
        Err(_) => {
            info!("process {:?} running, output in {}", pid, spec.log_path.display());
            Ok(LaunchHandle {
                child,
                log_path: spec.log_path.clone(),
            })
        }
    }
}

fn preflight(spec: &LaunchSpec) -> Result<()> {
    // Bare program names are resolved through PATH at spawn time.
    if spec.program.components().count() > 1 && !spec.program.is_file() {
        return Err(LauncherError::Launch {
            message: format!("java runtime not found: {}", spec.program.display()),
        });
    }
    if !spec.native_dir.is_dir() {
        return Err(LauncherError::Launch {
            message: format!(
                "native library directory not found: {}",
                spec.native_dir.display()
            ),
        });
    }
    if !spec.working_dir.is_dir() {
        return Err(LauncherError::Launch {
            message: format!("game directory not found: {}", spec.working_dir.display()),
        });
    }
    Ok(())
}

/// Last `MAX_LOG_EXCERPT_BYTES` of the log, lossily decoded.
fn read_log_excerpt(path: &Path) -> String {
    let read = || -> std::io::Result<String> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();
        file.seek(SeekFrom::Start(len.saturating_sub(MAX_LOG_EXCERPT_BYTES)))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    };
    read().unwrap_or_else(|e| format!("<log unavailable: {}>", e))
}
