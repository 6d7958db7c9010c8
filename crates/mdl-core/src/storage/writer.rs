//! Scoped writer for one saved payload.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::temp_path;

/// Writes to `<final>.part` and renames on `commit`. Dropping without commit
/// deletes the temp file.
pub struct StorageWriter {
    file: Option<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl StorageWriter {
    /// Create (or truncate) the temp file for `final_path`.
    pub fn create(final_path: &Path) -> Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
        Ok(StorageWriter {
            file: Some(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    /// Append `data` to the temp file.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .context("storage writer already closed")?;
        file.write_all(data).context("storage write failed")?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Sync, close and atomically rename the temp file to the final path.
    /// Returns the number of bytes written. Fails if the destination is on a different filesystem.
    pub fn commit(mut self) -> Result<u64> {
        let file = self
            .file
            .take()
            .context("storage writer already closed")?;
        file.sync_all().context("storage sync failed")?;
        drop(file);

        std::fs::rename(&self.temp_path, &self.final_path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                self.temp_path.display(),
                self.final_path.display()
            )
        })?;
        // Renamed away; nothing left for Drop to clean up.
        self.temp_path = PathBuf::new();
        Ok(self.written)
    }
}

impl Drop for StorageWriter {
    fn drop(&mut self) {
        self.file.take();
        if !self.temp_path.as_os_str().is_empty() && self.temp_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                tracing::warn!(path = %self.temp_path.display(), "could not remove temp file: {}", e);
            }
        }
    }
}
