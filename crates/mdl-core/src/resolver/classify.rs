//! Classify mirror responses into resolved / fatal / transient verdicts.

use crate::config::MdlConfig;
use crate::media::MediaKind;

use super::error::MirrorFailure;
use super::protocol::MirrorResponse;
use super::ResolvedMedia;

/// Marker tables deciding how mirror error texts are classified.
/// Markers are matched case-insensitively as substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationPolicy {
    pub fatal_markers: Vec<String>,
    pub network_markers: Vec<String>,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            fatal_markers: crate::config::default_fatal_markers(),
            network_markers: crate::config::default_network_markers(),
        }
    }
}

impl ClassificationPolicy {
    pub fn from_config(cfg: &MdlConfig) -> Self {
        Self {
            fatal_markers: lowercase_all(&cfg.fatal_markers),
            network_markers: lowercase_all(&cfg.network_markers),
        }
    }

    /// True if the error text says the link itself is unusable.
    pub fn is_fatal(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.fatal_markers
            .iter()
            .filter(|m| !m.is_empty())
            .any(|m| lower.contains(m.as_str()))
    }
}

fn lowercase_all(markers: &[String]) -> Vec<String> {
    markers.iter().map(|m| m.to_lowercase()).collect()
}

/// Outcome of a single mirror response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Resolved(ResolvedMedia),
    /// Link is unusable; the free-text reason from the mirror.
    Fatal(String),
    Transient(MirrorFailure),
}

/// Interprets a parsed mirror response.
///
/// `error` status: fatal if the text matches a fatal marker, otherwise transient.
/// Success: first picker entry (`picker` status only), then direct URL; neither
/// present is transient.
pub fn interpret(resp: &MirrorResponse, kind: MediaKind, policy: &ClassificationPolicy) -> Verdict {
    if resp.is_error() {
        let text = resp.text.clone().unwrap_or_default();
        if policy.is_fatal(&text) {
            return Verdict::Fatal(text);
        }
        return Verdict::Transient(MirrorFailure::Rejected(text));
    }

    let filename = || {
        resp.filename
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| kind.default_filename())
    };

    if let Some(url) = resp.first_picker_url().filter(|_| resp.is_picker()) {
        return Verdict::Resolved(ResolvedMedia {
            direct_url: url.to_string(),
            filename: filename(),
        });
    }
    if let Some(url) = resp.direct_url() {
        return Verdict::Resolved(ResolvedMedia {
            direct_url: url.to_string(),
            filename: filename(),
        });
    }
    Verdict::Transient(MirrorFailure::EmptyResponse)
}
