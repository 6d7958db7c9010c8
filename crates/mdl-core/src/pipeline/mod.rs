//! Session orchestration: link → mirror resolution → save target → stream → persist.
//!
//! One session is active at a time. Starting a new one cancels the previous
//! session's transfer before anything else happens. Captioning runs beside
//! resolution and only feeds display metadata. A failed in-process fetch
//! hands the direct URL to the system handler and still ends as completed.

mod error;
mod session;
mod state;

pub use error::PipelineError;
pub use session::{DownloadSession, PipelineEvent, SessionSnapshot};
pub use state::{format_progress, SessionState};

use anyhow::anyhow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::caption::{Captioner, MediaMetadata, UrlCaptioner};
use crate::config::MdlConfig;
use crate::control::SessionTicket;
use crate::downloader::{DownloadError, Engine, MediaPayload};
use crate::media::{MediaKind, MediaRequest};
use crate::persist::{
    persist, select_target, SaveCapability, SaveError, SaveRequest, SaveTarget, SystemOpener,
    UrlOpener,
};
use crate::resolver::{
    Classification, CurlTransport, MirrorTransport, ResolveFailure, ResolvedMedia, Resolver,
    ResolverOutcome,
};
use crate::url_model::validate_link;
use session::Shared;

/// How a session that did not error ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Saved { path: PathBuf, media: ResolvedMedia },
    /// In-process fetch failed; the link was given to the system handler.
    OpenedExternally { direct_url: String, reason: String },
    Cancelled,
}

pub struct Pipeline<T: MirrorTransport + 'static = CurlTransport> {
    resolver: Arc<Resolver<T>>,
    engine: Engine,
    captioner: Arc<dyn Captioner>,
    opener: Arc<dyn UrlOpener>,
    shared: Arc<Shared>,
    download_dir: PathBuf,
    error_display: Duration,
}

impl Pipeline<CurlTransport> {
    /// Curl mirrors, link-derived captions, `xdg-open` fallback.
    pub fn from_config(cfg: &MdlConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            Resolver::from_config(cfg),
            Arc::new(UrlCaptioner),
            Arc::new(SystemOpener),
            cfg.download_dir()?,
            cfg.error_display(),
        ))
    }
}

impl<T: MirrorTransport + 'static> Pipeline<T> {
    pub fn new(
        resolver: Resolver<T>,
        captioner: Arc<dyn Captioner>,
        opener: Arc<dyn UrlOpener>,
        download_dir: PathBuf,
        error_display: Duration,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            engine: Engine::new(),
            captioner,
            opener,
            shared: Arc::new(Shared::new()),
            download_dir,
            error_display,
        }
    }

    /// Event stream for a front-end. Only the latest subscriber receives events.
    pub fn subscribe(&self) -> UnboundedReceiver<PipelineEvent> {
        self.shared.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.shared.snapshot().state
    }

    pub fn progress(&self) -> f64 {
        self.shared.snapshot().progress
    }

    pub fn kind(&self) -> MediaKind {
        self.shared.snapshot().kind
    }

    /// Changes the selected media kind. Rejected while a session is in progress or failed.
    pub fn select_kind(&self, kind: MediaKind) -> Result<(), PipelineError> {
        self.shared.select_kind(kind).map_err(PipelineError::Busy)
    }

    /// Request for `url` with the currently selected kind.
    pub fn request_for(&self, url: &str) -> MediaRequest {
        MediaRequest::new(url, self.kind())
    }

    /// Aborts the active session: transfer stopped, state `Idle`, progress 0,
    /// nothing persisted. Returns false if nothing was running.
    pub fn cancel(&self) -> bool {
        let stopped = self.shared.stop(false);
        if stopped {
            tracing::info!("session cancelled by user");
        }
        stopped
    }

    /// Back to a clean `Idle`, aborting anything still running.
    pub fn reset(&self) {
        self.shared.stop(true);
    }

    /// Runs one full session for `request`.
    ///
    /// Errors are also reflected in the snapshot as `Error` for the configured
    /// display time, then revert to `Idle` unless a newer action happened.
    pub async fn run(
        &self,
        request: MediaRequest,
        save: SaveCapability,
    ) -> Result<SessionOutcome, PipelineError> {
        if let Err(e) = validate_link(request.source_url()) {
            let err = PipelineError::InvalidLink(e);
            tracing::warn!(url = %request.source_url(), error = %err, "link rejected");
            let version = self.shared.fail_untracked(&err.user_message());
            self.schedule_revert(version);
            return Err(err);
        }

        let ticket = self.shared.begin(request.kind());
        tracing::info!(
            session = ticket.generation,
            url = %request.source_url(),
            kind = %request.kind(),
            "session started"
        );

        let result = self.drive(&request, save, &ticket).await;
        self.shared.finish(&ticket);

        match result {
            Ok(outcome) => Ok(outcome),
            Err(PipelineError::Cancelled) => {
                tracing::info!(session = ticket.generation, "session ended without saving");
                Ok(SessionOutcome::Cancelled)
            }
            Err(err) => {
                tracing::error!(session = ticket.generation, error = %err, "session failed");
                if let Some(version) = self.shared.fail(&ticket, &err.user_message()) {
                    self.schedule_revert(version);
                }
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        request: &MediaRequest,
        save: SaveCapability,
        ticket: &SessionTicket,
    ) -> Result<SessionOutcome, PipelineError> {
        let caption = async {
            let metadata = self.caption(request).await;
            self.shared.apply(ticket, |snap| {
                snap.metadata = Some(metadata.clone());
                vec![PipelineEvent::Metadata(metadata)]
            });
        };
        let ((), outcome) = tokio::join!(caption, self.resolve(request));
        check(ticket)?;

        let media = match outcome {
            ResolverOutcome::Resolved(media) => media,
            ResolverOutcome::Failed(failure) => return Err(resolve_error(failure)),
        };
        self.shared.apply(ticket, |snap| {
            snap.session = Some(DownloadSession::new(request.clone(), &media));
            vec![PipelineEvent::Resolved(media.clone())]
        });

        let target = self
            .choose_target(save, &media.filename, request.kind(), ticket)
            .await?;
        check(ticket)?;

        self.shared.transition(ticket, SessionState::Downloading);
        let payload = match self.fetch(&media, request.kind(), ticket).await {
            Ok(payload) => payload,
            Err(PipelineError::Network(e)) => {
                return Ok(self.open_externally(&media, e, ticket).await)
            }
            Err(e) => return Err(e),
        };
        check(ticket)?;

        self.shared.transition(ticket, SessionState::Converting);
        let filename = media.filename.clone();
        let path = tokio::task::spawn_blocking(move || persist(&payload, &filename, &target))
            .await
            .map_err(|e| SaveError::from(anyhow!("save task failed: {}", e)))??;

        self.shared.complete(
            ticket,
            vec![PipelineEvent::Saved { path: path.clone() }],
        );
        Ok(SessionOutcome::Saved { path, media })
    }

    async fn caption(&self, request: &MediaRequest) -> MediaMetadata {
        let captioner = Arc::clone(&self.captioner);
        let url = request.source_url().to_string();
        let kind = request.kind();
        match tokio::task::spawn_blocking(move || captioner.analyze(&url, kind)).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!(error = %e, "captioning task failed; using fallback metadata");
                MediaMetadata::default()
            }
        }
    }

    async fn resolve(&self, request: &MediaRequest) -> ResolverOutcome {
        let resolver = Arc::clone(&self.resolver);
        let request = request.clone();
        match tokio::task::spawn_blocking(move || resolver.resolve(&request)).await {
            Ok(outcome) => outcome,
            Err(e) => ResolverOutcome::Failed(ResolveFailure {
                classification: Classification::Transient,
                message: format!("resolver task failed: {}", e),
                network: false,
            }),
        }
    }

    /// Picks the destination before any media byte is fetched.
    async fn choose_target(
        &self,
        save: SaveCapability,
        filename: &str,
        kind: MediaKind,
        ticket: &SessionTicket,
    ) -> Result<SaveTarget, PipelineError> {
        if matches!(save, SaveCapability::Available(_)) {
            self.shared.transition(ticket, SessionState::WaitingForSave);
        }
        let request = SaveRequest::new(filename, kind);
        let dir = self.download_dir.clone();
        let selected = tokio::task::spawn_blocking(move || select_target(&save, &request, dir))
            .await
            .map_err(|e| SaveError::from(anyhow!("save chooser task failed: {}", e)))?;
        match selected {
            Ok(target) => Ok(target),
            Err(_) => {
                tracing::info!("save location selection cancelled");
                self.shared.abandon(ticket);
                Err(PipelineError::Cancelled)
            }
        }
    }

    async fn fetch(
        &self,
        media: &ResolvedMedia,
        kind: MediaKind,
        ticket: &SessionTicket,
    ) -> Result<MediaPayload, PipelineError> {
        let shared = Arc::clone(&self.shared);
        let progress_ticket = ticket.clone();
        let result = self
            .engine
            .download(&media.direct_url, kind, ticket.token.clone(), move |update| {
                shared.record_progress(&progress_ticket, update)
            })
            .await;
        match result {
            Ok(payload) => Ok(payload),
            Err(DownloadError::Cancelled) => Err(PipelineError::Cancelled),
            Err(e) => Err(PipelineError::Network(e)),
        }
    }

    async fn open_externally(
        &self,
        media: &ResolvedMedia,
        cause: DownloadError,
        ticket: &SessionTicket,
    ) -> SessionOutcome {
        let reason = cause.to_string();
        tracing::warn!(
            url = %media.direct_url,
            error = %reason,
            "in-process download failed; opening link with system handler"
        );
        let opener = Arc::clone(&self.opener);
        let url = media.direct_url.clone();
        match tokio::task::spawn_blocking(move || opener.open(&url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(error = %format!("{:#}", e), "could not open link externally")
            }
            Err(e) => tracing::error!(error = %e, "opener task failed"),
        }
        self.shared.complete(
            ticket,
            vec![PipelineEvent::OpenedExternally {
                direct_url: media.direct_url.clone(),
            }],
        );
        SessionOutcome::OpenedExternally {
            direct_url: media.direct_url.clone(),
            reason,
        }
    }

    fn schedule_revert(&self, version: u64) {
        let shared = Arc::clone(&self.shared);
        let delay = self.error_display;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.revert_error(version);
        });
    }
}

fn check(ticket: &SessionTicket) -> Result<(), PipelineError> {
    ticket.token.check().map_err(|_| PipelineError::Cancelled)
}

fn resolve_error(failure: ResolveFailure) -> PipelineError {
    match failure.classification {
        Classification::Fatal => PipelineError::ResolverFatal(failure.message),
        Classification::Transient => PipelineError::ResolverExhausted {
            network: failure.network,
            message: failure.message,
        },
    }
}
