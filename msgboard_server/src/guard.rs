use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

const LOCK_FILE_NAME: &str = "msgboard_server.lock";

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("a server is already running (lock file {})", .0.display())]
    AlreadyRunning(PathBuf),
    #[error("cannot create lock file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Marker file proving this process is the only running server. Removed on
/// drop.
#[derive(Debug)]
pub struct InstanceGuard {
    path: PathBuf,
}

impl InstanceGuard {
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(LOCK_FILE_NAME)
    }

    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, GuardError> {
        let path = path.into();

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(GuardError::AlreadyRunning(path))
            }
            Err(source) => return Err(GuardError::Io { path, source }),
        };

        if let Err(source) = writeln!(file, "{}", std::process::id()) {
            let _ = fs::remove_file(&path);
            return Err(GuardError::Io { path, source });
        }

        debug!("Acquired instance lock {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Could not remove lock file {}: {}", self.path.display(), e);
        }
    }
}
