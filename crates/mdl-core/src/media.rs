//! Media request model: what the user asked for and what kind of file it yields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Desired media kind. Selects the audio-only flag sent to mirrors and the
/// MIME type / extension of the saved file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Video,
    Audio,
}

impl MediaKind {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            MediaKind::Video => "video/mp4",
            MediaKind::Audio => "audio/mpeg",
        }
    }

    /// Human label for save dialogs ("Video File" / "Audio File").
    pub fn description(self) -> &'static str {
        match self {
            MediaKind::Video => "Video File",
            MediaKind::Audio => "Audio File",
        }
    }

    /// Filename used when the mirror does not provide one.
    pub fn default_filename(self) -> String {
        format!("download.{}", self.extension())
    }

    pub fn is_audio_only(self) -> bool {
        self == MediaKind::Audio
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// One user action: a source link and the kind of media wanted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    source_url: String,
    kind: MediaKind,
}

impl MediaRequest {
    /// Builds a request from raw user input. Surrounding whitespace is trimmed;
    /// validation happens in [`crate::url_model::validate_link`].
    pub fn new(source_url: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            source_url: source_url.into().trim().to_string(),
            kind,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}
