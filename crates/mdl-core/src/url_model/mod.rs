//! Link modeling: platform detection, validation and canonicalization.
//!
//! Mirrors fail spuriously on tracking parameters for some platforms, so
//! links are normalized before being sent out. Unrecognized links pass through.

mod sanitize;

pub use sanitize::sanitize_filename;

use url::Url;

/// Platforms with link-specific handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    TikTok,
    Unknown,
}

impl Platform {
    /// Detects the platform from the raw link text (case-insensitive).
    pub fn detect(link: &str) -> Platform {
        let lower = link.to_ascii_lowercase();
        if lower.contains("youtube.com") || lower.contains("youtu.be") {
            Platform::YouTube
        } else if lower.contains("tiktok.com") {
            Platform::TikTok
        } else {
            Platform::Unknown
        }
    }
}

/// Error returned when a link is rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("link is empty")]
    Empty,
    #[error("link is not a URL or a recognized platform link: {0}")]
    Unrecognized(String),
}

/// Rejects inputs that are empty, or neither a recognized platform link nor
/// something starting with `http`.
pub fn validate_link(link: &str) -> Result<(), LinkError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(LinkError::Empty);
    }
    if Platform::detect(link) == Platform::Unknown && !link.starts_with("http") {
        return Err(LinkError::Unrecognized(link.to_string()));
    }
    Ok(())
}

/// Canonicalizes a link for mirror submission.
///
/// TikTok links keep only scheme, host and path (query and fragment carry
/// tracking noise). YouTube links pass through unchanged because the video id
/// lives in the query. Anything unparseable or unrecognized passes through.
pub fn normalize(link: &str) -> String {
    let parsed = match Url::parse(link) {
        Ok(u) => u,
        Err(_) => return link.to_string(),
    };
    let host = parsed.host_str().unwrap_or("").to_ascii_lowercase();

    if host.contains("youtube") || host.contains("youtu.be") {
        return link.to_string();
    }
    if host.contains("tiktok") {
        return format!("{}{}", parsed.origin().ascii_serialization(), parsed.path());
    }
    link.to_string()
}
