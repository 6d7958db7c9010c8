//! Pipeline error taxonomy.

use super::state::SessionState;
use crate::downloader::DownloadError;
use crate::persist::SaveError;
use crate::url_model::LinkError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Rejected before any network call.
    #[error("invalid link: {0}")]
    InvalidLink(#[from] LinkError),
    /// A mirror confirmed the link is invalid, private or deleted.
    #[error("{0}")]
    ResolverFatal(String),
    /// Every mirror failed transiently.
    #[error("{message}")]
    ResolverExhausted { network: bool, message: String },
    /// Non-2xx status or stream failure while downloading.
    #[error("download failed: {0}")]
    Network(#[from] DownloadError),
    #[error(transparent)]
    Save(#[from] SaveError),
    /// User-initiated; never shown as an error.
    #[error("cancelled")]
    Cancelled,
    /// Media kind changes are only allowed while idle or completed.
    #[error("cannot change media kind while {0}")]
    Busy(SessionState),
}

impl PipelineError {
    /// Text for the transient error banner.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::InvalidLink(_) => "Invalid link.".to_string(),
            PipelineError::ResolverFatal(msg) => msg.clone(),
            PipelineError::ResolverExhausted { message, .. } => message.clone(),
            PipelineError::Network(_) => "Download failed.".to_string(),
            PipelineError::Save(_) => "Could not save the file.".to_string(),
            PipelineError::Cancelled => String::new(),
            PipelineError::Busy(state) => format!("Busy ({}).", state),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
