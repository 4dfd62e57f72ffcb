//! Scoped on-disk storage for the intermediate files of one job run.
//!
//! Every path handed out lives inside a private `job-*` directory under the
//! configured work dir. `cleanup` removes the tracked files and then the
//! directory itself; if the store is dropped without cleanup the directory
//! is still removed by `TempDir`'s destructor.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::MediaResult;
use crate::fs_utils::remove_if_exists;

/// Outcome of a cleanup pass. Failures are reported, never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: usize,
}

/// Per-run scratch space, exclusively owned by one pipeline run.
#[derive(Debug)]
pub struct TempAssets {
    dir: TempDir,
    tracked: Mutex<Vec<PathBuf>>,
}

impl TempAssets {
    /// Create a fresh scratch directory under `root`.
    pub fn create_in(root: impl AsRef<Path>) -> MediaResult<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix("job-").tempdir_in(root)?;
        debug!(dir = %dir.path().display(), "Created job scratch directory");
        Ok(Self {
            dir,
            tracked: Mutex::new(Vec::new()),
        })
    }

    /// Scratch directory path.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Reserve a path for an intermediate file and track it for cleanup.
    pub fn allocate(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut tracked = self.tracked.lock().unwrap_or_else(PoisonError::into_inner);
        if !tracked.contains(&path) {
            tracked.push(path.clone());
        }
        path
    }

    /// Paths currently tracked.
    pub fn tracked(&self) -> Vec<PathBuf> {
        self.tracked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delete a superseded asset now instead of at the end of the run.
    pub async fn discard(&self, path: &Path) {
        match remove_if_exists(path).await {
            Ok(_) => {
                self.tracked
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .retain(|p| p != path);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to discard temp asset"),
        }
    }

    /// Remove every tracked asset and the scratch directory.
    pub async fn cleanup(self) -> CleanupReport {
        let mut report = CleanupReport::default();
        let tracked = std::mem::take(
            &mut *self.tracked.lock().unwrap_or_else(PoisonError::into_inner),
        );

        for path in tracked {
            match remove_if_exists(&path).await {
                Ok(true) => report.removed += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!(path = %path.display(), error = %e, "Failed to remove temp asset");
                }
            }
        }

        let dir_path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            report.failed += 1;
            warn!(dir = %dir_path.display(), error = %e, "Failed to remove job scratch directory");
        }

        report
    }
}
