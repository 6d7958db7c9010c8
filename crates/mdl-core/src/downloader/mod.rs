//! Stream download engine.
//!
//! Fetches a direct media URL as one streaming GET, reports progress per
//! chunk, and assembles the chunks into a single in-memory payload tagged with
//! the MIME type of the requested kind. Cancellation discards everything
//! received so far.

mod progress;
mod stream;

pub use progress::{
    ProgressTracker, ProgressUpdate, COMPLETE, DETERMINATE_CAP, INDETERMINATE_CAP,
    INDETERMINATE_STEP,
};

use crate::control::CancelToken;
use crate::media::MediaKind;

/// Error from a streaming download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Transfer failed (connection, TLS, reset mid-stream).
    #[error("transfer failed: {0}")]
    Transfer(#[from] curl::Error),
    /// The session's cancel token was set.
    #[error("download cancelled")]
    Cancelled,
    /// The blocking download task panicked or was aborted.
    #[error("download task failed: {0}")]
    Task(String),
}

/// Fully assembled media body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
}

impl MediaPayload {
    /// Concatenates chunks in arrival order.
    pub fn assemble(chunks: Vec<Vec<u8>>, kind: MediaKind) -> Self {
        let len = chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(len);
        for chunk in chunks {
            bytes.extend_from_slice(&chunk);
        }
        Self { bytes, kind }
    }

    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Streaming download engine. Stateless; each call is one transfer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Self
    }

    /// Downloads `direct_url` on a blocking thread, calling `on_progress` after each chunk.
    ///
    /// Returns `DownloadError::Cancelled` if `cancel` is set before the stream ends;
    /// received chunks are dropped in that case.
    pub async fn download<F>(
        &self,
        direct_url: &str,
        kind: MediaKind,
        cancel: CancelToken,
        mut on_progress: F,
    ) -> Result<MediaPayload, DownloadError>
    where
        F: FnMut(ProgressUpdate) + Send + 'static,
    {
        let url = direct_url.to_string();
        tracing::debug!(url = %url, %kind, "starting streaming download");

        let fetched = tokio::task::spawn_blocking(move || {
            stream::fetch_blocking(&url, &cancel, &mut on_progress)
        })
        .await
        .map_err(|e| DownloadError::Task(e.to_string()))?;

        let body = match fetched {
            Ok(body) => body,
            Err(DownloadError::Cancelled) => {
                tracing::info!("download cancelled; discarding received data");
                return Err(DownloadError::Cancelled);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            bytes = body.bytes_received,
            total = ?body.total_bytes,
            chunks = body.chunks.len(),
            "download stream finished"
        );
        Ok(MediaPayload::assemble(body.chunks, kind))
    }
}
