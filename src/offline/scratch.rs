use crate::errors::{AppError, AppResult};
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, warn};

/// Uniquely named staging directory owned by one bucket of one run.
///
/// Call [`ScratchDir::release`] to delete it and observe the result. A scratch
/// directory that is dropped without being released is still removed, but
/// removal errors are only logged.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Creates `<root>/<prefix><random>`, creating `root` first if needed.
    pub fn create(root: &Path, prefix: &str) -> AppResult<Self> {
        std::fs::create_dir_all(root).map_err(|e| {
            AppError::IoError(format!(
                "Failed to create scratch root {}: {}",
                root.display(),
                e
            ))
        })?;

        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(root)
            .map_err(|e| {
                AppError::IoError(format!(
                    "Failed to create scratch directory in {}: {}",
                    root.display(),
                    e
                ))
            })?;
        debug!(scratch_dir = %dir.path().display(), "Scratch directory created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the directory and everything in it.
    pub fn release(self) -> AppResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            warn!(scratch_dir = %path.display(), error = %e, "Failed to remove scratch directory");
            AppError::IoError(format!(
                "Failed to remove scratch directory {}: {}",
                path.display(),
                e
            ))
        })?;
        debug!(scratch_dir = %path.display(), "Scratch directory removed");
        Ok(())
    }
}
