//! Mirror wire protocol: JSON request body and status-tagged JSON response.

use serde::{Deserialize, Serialize};

use crate::config::RequestPreferences;
use crate::media::MediaKind;

/// Body POSTed to every mirror endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveBody {
    pub url: String,
    pub v_codec: String,
    pub v_quality: String,
    pub a_format: String,
    pub is_audio_only: bool,
    pub filename_pattern: String,
    /// Asks mirrors not to embed tags into the file.
    pub disable_metadata: bool,
}

impl ResolveBody {
    pub fn new(normalized_url: &str, kind: MediaKind, prefs: &RequestPreferences) -> Self {
        Self {
            url: normalized_url.to_string(),
            v_codec: prefs.video_codec.clone(),
            v_quality: prefs.video_quality.clone(),
            a_format: prefs.audio_format.clone(),
            is_audio_only: kind.is_audio_only(),
            filename_pattern: prefs.filename_pattern.clone(),
            disable_metadata: true,
        }
    }
}

/// Response from a mirror. `status` is `error`, `picker`, or a success tag
/// such as `stream`, `redirect` or `tunnel`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MirrorResponse {
    pub status: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub picker: Option<Vec<PickerItem>>,
    #[serde(default)]
    pub text: Option<String>,
}

/// One candidate in a picker response. Other fields (type, thumb) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PickerItem {
    #[serde(default)]
    pub url: Option<String>,
}

impl MirrorResponse {
    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }

    pub fn is_picker(&self) -> bool {
        self.status.eq_ignore_ascii_case("picker")
    }

    /// URL of the first picker entry, if the picker list is present and non-empty.
    pub fn first_picker_url(&self) -> Option<&str> {
        self.picker
            .as_ref()?
            .first()?
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
    }

    pub fn direct_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}
