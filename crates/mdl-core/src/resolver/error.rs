//! Per-mirror failure reasons. Every variant is transient: the resolver moves
//! on to the next mirror. Fatal link errors are reported separately.

/// Why a single mirror attempt did not produce a direct URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MirrorFailure {
    /// Request exceeded the per-mirror timeout.
    #[error("timed out after {0}s")]
    Timeout(u64),
    /// Network-level failure (DNS, connect, reset).
    #[error("network error: {0}")]
    Connection(String),
    /// Mirror answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Mirror returned `status: error` with a non-fatal reason (rate limit, busy, blocked).
    #[error("rejected: {0}")]
    Rejected(String),
    /// Success status without a picker entry or direct URL.
    #[error("empty response from mirror")]
    EmptyResponse,
    /// Response body was not the expected JSON.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl MirrorFailure {
    /// True when the failure is network-related, either by kind or because the
    /// rejection text contains one of `network_markers` (lowercase substrings).
    pub fn is_network(&self, network_markers: &[String]) -> bool {
        match self {
            MirrorFailure::Timeout(_) | MirrorFailure::Connection(_) => true,
            MirrorFailure::Rejected(text) => {
                let lower = text.to_lowercase();
                network_markers.iter().any(|m| lower.contains(m.as_str()))
            }
            MirrorFailure::Http(_) | MirrorFailure::EmptyResponse | MirrorFailure::Malformed(_) => {
                false
            }
        }
    }
}
