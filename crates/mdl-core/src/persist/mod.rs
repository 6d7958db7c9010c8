//! Persistence of downloaded payloads.
//!
//! The destination is chosen once per session, before the fetch starts:
//! either a user-granted [`WritableHandle`] (persistent target) or the
//! download directory under the suggested name (ephemeral target). The two
//! are never mixed within a session.

mod ephemeral;
mod handle;
mod opener;

pub use ephemeral::save_ephemeral;
pub use handle::WritableHandle;
pub use opener::{SystemOpener, UrlOpener};

use std::path::PathBuf;

use crate::downloader::MediaPayload;
use crate::media::MediaKind;

/// Failure while writing the payload to its destination.
#[derive(Debug, thiserror::Error)]
#[error("could not save file: {0:#}")]
pub struct SaveError(#[from] anyhow::Error);

/// Why a save-location chooser did not return a handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChooseError {
    /// User dismissed the chooser. The whole operation is abandoned.
    #[error("save location selection cancelled")]
    Cancelled,
    /// Chooser unusable (unsupported, denied, no terminal). Falls back to an ephemeral save.
    #[error("save location chooser failed: {0}")]
    Failed(String),
}

/// What a chooser is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub suggested_name: String,
    pub mime_type: &'static str,
    /// Extension filter, with leading dot.
    pub extension: String,
    pub description: &'static str,
}

impl SaveRequest {
    pub fn new(suggested_name: &str, kind: MediaKind) -> Self {
        Self {
            suggested_name: suggested_name.to_string(),
            mime_type: kind.mime_type(),
            extension: format!(".{}", kind.extension()),
            description: kind.description(),
        }
    }
}

/// Interactive "save to chosen location" capability.
pub trait SaveLocationChooser: Send + Sync {
    /// May block waiting for the user.
    fn choose(&self, request: &SaveRequest) -> Result<WritableHandle, ChooseError>;
}

/// Platform capability, selected once per session and never probed mid-operation.
pub enum SaveCapability {
    Available(Box<dyn SaveLocationChooser>),
    Unavailable,
}

impl std::fmt::Debug for SaveCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveCapability::Available(_) => write!(f, "Available"),
            SaveCapability::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// Where the payload of one session goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    /// User-chosen destination.
    PersistentHandle(WritableHandle),
    /// Download directory; final name is the suggested name made unique.
    Ephemeral { dir: PathBuf },
}

/// Outcome of [`select_target`] when the user backed out of the chooser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCancelled;

/// Runs the capability probe: asks the chooser (if any) for a destination.
///
/// A cancelled chooser aborts; any other chooser failure falls through to
/// the ephemeral target so the download still happens.
pub fn select_target(
    capability: &SaveCapability,
    request: &SaveRequest,
    fallback_dir: PathBuf,
) -> Result<SaveTarget, SelectionCancelled> {
    match capability {
        SaveCapability::Unavailable => Ok(SaveTarget::Ephemeral { dir: fallback_dir }),
        SaveCapability::Available(chooser) => match chooser.choose(request) {
            Ok(handle) => {
                tracing::debug!(path = %handle.path().display(), "save location chosen");
                Ok(SaveTarget::PersistentHandle(handle))
            }
            Err(ChooseError::Cancelled) => Err(SelectionCancelled),
            Err(ChooseError::Failed(reason)) => {
                tracing::warn!(%reason, "save chooser failed; saving to download directory");
                Ok(SaveTarget::Ephemeral { dir: fallback_dir })
            }
        },
    }
}

/// Writes `payload` to `target`. Returns the path the file ended up at.
pub fn persist(
    payload: &MediaPayload,
    suggested_filename: &str,
    target: &SaveTarget,
) -> Result<PathBuf, SaveError> {
    let path = match target {
        SaveTarget::PersistentHandle(handle) => {
            handle.write(payload)?;
            handle.path().to_path_buf()
        }
        SaveTarget::Ephemeral { dir } => save_ephemeral(payload, suggested_filename, dir)?,
    };
    tracing::info!(
        path = %path.display(),
        bytes = payload.len(),
        mime = payload.mime_type(),
        "payload saved"
    );
    Ok(path)
}
