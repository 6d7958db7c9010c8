//! User-granted destination for one session.

use anyhow::Context;
use std::path::{Path, PathBuf};

use super::SaveError;
use crate::downloader::MediaPayload;
use crate::storage::StorageWriter;

/// A destination the user picked. Writing opens a scoped temp-file stream,
/// writes the whole payload and commits; the temp file is released on every
/// exit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritableHandle {
    path: PathBuf,
}

impl WritableHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the full payload. Returns the number of bytes written.
    pub fn write(&self, payload: &MediaPayload) -> Result<u64, SaveError> {
        let mut writer = StorageWriter::create(&self.path)?;
        writer
            .write_all(&payload.bytes)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(writer.commit()?)
    }
}
