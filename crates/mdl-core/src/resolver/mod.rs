//! Mirror resolver: turns a user link into a direct, fetchable media URL.
//!
//! One pass over a freshly shuffled mirror list. Each mirror gets one request
//! with a bounded timeout. A fatal verdict (link invalid, private, deleted)
//! stops the loop at once; every other failure moves on to the next mirror.
//! No backoff, no second pass.

mod classify;
mod error;
mod protocol;
mod shuffle;
mod transport;

pub use classify::{interpret, ClassificationPolicy, Verdict};
pub use error::MirrorFailure;
pub use protocol::{MirrorResponse, PickerItem, ResolveBody};
pub use shuffle::shuffled;
pub use transport::{classify_curl_error, CurlTransport, MirrorTransport};

use rand::Rng;
use std::time::Duration;

use crate::config::{MdlConfig, RequestPreferences};
use crate::media::MediaRequest;
use crate::url_model;

/// Message for a fatal verdict, shown to the user as-is.
pub const FATAL_MESSAGE: &str = "The link does not exist or the content is private.";

const EXHAUSTED_PREFIX: &str = "All mirrors are busy. ";
const EXHAUSTED_NETWORK: &str =
    "Network error (connection blocked or offline). Check your connection or try again later.";
const EXHAUSTED_REJECTED: &str =
    "Could not get a download link. The media may be IP-blocked on every mirror or removed.";
const NO_MIRRORS: &str = "No mirrors are configured.";

/// One configured mirror endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEndpoint {
    pub address: String,
}

impl MirrorEndpoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// A usable direct media URL plus the filename to save it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub direct_url: String,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Link itself is unusable; no other mirror was tried after it.
    Fatal,
    /// Every mirror failed for reasons attributable to the mirror.
    Transient,
}

/// Final failure of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveFailure {
    pub classification: Classification,
    pub message: String,
    /// For transient failures: whether the last mirror error looked network-related.
    pub network: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverOutcome {
    Resolved(ResolvedMedia),
    Failed(ResolveFailure),
}

/// Multi-mirror resolver, generic over the transport for testing.
pub struct Resolver<T: MirrorTransport = CurlTransport> {
    mirrors: Vec<MirrorEndpoint>,
    policy: ClassificationPolicy,
    prefs: RequestPreferences,
    timeout: Duration,
    transport: T,
}

impl Resolver<CurlTransport> {
    pub fn from_config(cfg: &MdlConfig) -> Self {
        Self::with_transport(cfg, CurlTransport)
    }
}

impl<T: MirrorTransport> Resolver<T> {
    pub fn with_transport(cfg: &MdlConfig, transport: T) -> Self {
        Self {
            mirrors: cfg.mirrors.iter().map(MirrorEndpoint::new).collect(),
            policy: ClassificationPolicy::from_config(cfg),
            prefs: cfg.request.clone(),
            timeout: cfg.mirror_timeout(),
            transport,
        }
    }

    pub fn mirrors(&self) -> &[MirrorEndpoint] {
        &self.mirrors
    }

    /// Resolves with a thread-local random mirror order.
    /// Blocking; call from `spawn_blocking` in async code.
    pub fn resolve(&self, request: &MediaRequest) -> ResolverOutcome {
        self.resolve_with_rng(request, &mut rand::thread_rng())
    }

    /// Resolves using `rng` to order the mirrors.
    pub fn resolve_with_rng<R: Rng + ?Sized>(
        &self,
        request: &MediaRequest,
        rng: &mut R,
    ) -> ResolverOutcome {
        if self.mirrors.is_empty() {
            tracing::warn!("resolve called with no mirrors configured");
            return ResolverOutcome::Failed(ResolveFailure {
                classification: Classification::Transient,
                message: NO_MIRRORS.to_string(),
                network: false,
            });
        }

        let normalized = url_model::normalize(request.source_url());
        let body = ResolveBody::new(&normalized, request.kind(), &self.prefs);
        let body = match serde_json::to_vec(&body) {
            Ok(b) => b,
            Err(e) => {
                return ResolverOutcome::Failed(ResolveFailure {
                    classification: Classification::Transient,
                    message: format!("could not encode request: {}", e),
                    network: false,
                })
            }
        };

        let order = shuffled(&self.mirrors, rng);
        let mut last_failure: Option<MirrorFailure> = None;

        for endpoint in &order {
            tracing::debug!(endpoint = %endpoint.address, "connecting to mirror");
            match self.try_mirror(endpoint, &body, request) {
                Verdict::Resolved(media) => {
                    tracing::info!(
                        endpoint = %endpoint.address,
                        filename = %media.filename,
                        "mirror resolved link"
                    );
                    return ResolverOutcome::Resolved(media);
                }
                Verdict::Fatal(text) => {
                    tracing::info!(endpoint = %endpoint.address, reason = %text, "link rejected as unusable");
                    return ResolverOutcome::Failed(ResolveFailure {
                        classification: Classification::Fatal,
                        message: FATAL_MESSAGE.to_string(),
                        network: false,
                    });
                }
                Verdict::Transient(failure) => {
                    if let MirrorFailure::Rejected(text) = &failure {
                        tracing::warn!(endpoint = %endpoint.address, reason = %text, "mirror busy/blocked");
                    } else {
                        tracing::debug!(endpoint = %endpoint.address, error = %failure, "mirror failed");
                    }
                    last_failure = Some(failure);
                }
            }
        }

        let network = last_failure
            .as_ref()
            .map(|f| f.is_network(&self.policy.network_markers))
            .unwrap_or(false);
        tracing::error!(
            tried = order.len(),
            last_error = ?last_failure,
            "all mirrors failed"
        );
        ResolverOutcome::Failed(ResolveFailure {
            classification: Classification::Transient,
            message: exhausted_message(network),
            network,
        })
    }

    fn try_mirror(&self, endpoint: &MirrorEndpoint, body: &[u8], request: &MediaRequest) -> Verdict {
        let raw = match self
            .transport
            .post_json(&endpoint.address, body, self.timeout)
        {
            Ok(raw) => raw,
            Err(failure) => return Verdict::Transient(failure),
        };
        match serde_json::from_slice::<MirrorResponse>(&raw) {
            Ok(resp) => interpret(&resp, request.kind(), &self.policy),
            Err(e) => Verdict::Transient(MirrorFailure::Malformed(e.to_string())),
        }
    }
}

/// User-facing message once every mirror failed transiently.
pub fn exhausted_message(network: bool) -> String {
    let detail = if network {
        EXHAUSTED_NETWORK
    } else {
        EXHAUSTED_REJECTED
    };
    format!("{}{}", EXHAUSTED_PREFIX, detail)
}

#[cfg(test)]
mod tests;
