//! Display-only metadata for a link (title, author).
//!
//! Best effort and infallible: every path ends in a fallback value. Runs
//! beside resolution and never influences it.

use url::Url;

use crate::media::MediaKind;
use crate::url_model::Platform;

pub const FALLBACK_TITLE: &str = "Untitled media";
pub const FALLBACK_AUTHOR: &str = "Unknown source";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    pub title: String,
    pub author: String,
}

impl Default for MediaMetadata {
    fn default() -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            author: FALLBACK_AUTHOR.to_string(),
        }
    }
}

/// Captioning service. Implementations must not fail; return the fallback instead.
pub trait Captioner: Send + Sync {
    fn analyze(&self, url: &str, kind: MediaKind) -> MediaMetadata;
}

/// Derives metadata from the link itself (platform ids, path, host).
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlCaptioner;

impl Captioner for UrlCaptioner {
    fn analyze(&self, url: &str, _kind: MediaKind) -> MediaMetadata {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => return MediaMetadata::default(),
        };
        let host = parsed
            .host_str()
            .map(|h| h.trim_start_matches("www.").to_string());
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        let (title, author) = match Platform::detect(url) {
            Platform::YouTube => {
                let id = parsed
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())
                    .or_else(|| segments.last().map(|s| s.to_string()));
                (
                    id.map(|id| format!("YouTube video {}", id)),
                    Some("YouTube".to_string()),
                )
            }
            Platform::TikTok => {
                let user = segments.iter().find(|s| s.starts_with('@')).map(|s| s.to_string());
                let id = segments.last().map(|s| format!("TikTok video {}", s));
                (id, user.or_else(|| Some("TikTok".to_string())))
            }
            Platform::Unknown => (segments.last().map(|s| title_from_segment(s)), host),
        };

        MediaMetadata {
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            author: author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_AUTHOR.to_string()),
        }
    }
}

/// "my-cool_clip.mp4" → "my cool clip"
fn title_from_segment(segment: &str) -> String {
    let stem = match segment.rfind('.') {
        Some(i) if i > 0 => &segment[..i],
        _ => segment,
    };
    stem.replace(['-', '_'], " ").trim().to_string()
}
