//! Opening mounted assets with the desktop's default handler.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

/// Launcher error types
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Opener '{0}' not found; is it installed and in PATH?")]
    NotFound(String),

    #[error("Failed to start {opener:?}: {source}")]
    Spawn {
        opener: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs a configured opener program (`xdg-open` by default) on a path.
#[derive(Debug, Clone)]
pub struct Launcher {
    opener: PathBuf,
}

impl Launcher {
    /// Resolve `opener` as an existing path, or else by searching `PATH`.
    pub fn discover(opener: &str) -> Result<Self, LaunchError> {
        let direct = Path::new(opener);
        let resolved = if direct.components().count() > 1 && direct.exists() {
            direct.to_path_buf()
        } else {
            which::which(opener).map_err(|_| LaunchError::NotFound(opener.to_string()))?
        };

        debug!(opener = ?resolved, "Resolved opener");
        Ok(Self { opener: resolved })
    }

    pub fn opener(&self) -> &Path {
        &self.opener
    }

    /// Start the opener on `target` without waiting for it.
    ///
    /// The child is reaped on a background thread once it exits.
    pub fn open(&self, target: &Path) -> Result<u32, LaunchError> {
        let mut child = Command::new(&self.opener)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                opener: self.opener.clone(),
                source,
            })?;

        let pid = child.id();
        info!(pid, target = ?target, "Opened asset");

        std::thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => warn!(pid, %status, "Opener exited with failure"),
            Ok(_) => {}
            Err(e) => warn!(pid, error = %e, "Failed waiting for opener"),
        });

        Ok(pid)
    }
}
