//! Observable session state, guarded by the single active-session slot.
//!
//! Every update coming from a session carries its [`SessionTicket`]; updates
//! from a cancelled or superseded session are dropped under the same lock
//! that `cancel`/`begin` take, so a stale session can never overwrite the
//! state of a newer one.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::state::{format_progress, SessionState};
use crate::caption::MediaMetadata;
use crate::control::{SessionControl, SessionTicket};
use crate::downloader::{ProgressUpdate, COMPLETE};
use crate::media::{MediaKind, MediaRequest};
use crate::resolver::ResolvedMedia;

/// The download half of a session, known once resolution succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSession {
    pub request: MediaRequest,
    pub direct_url: String,
    pub filename: String,
    pub bytes_received: u64,
    pub total_bytes: Option<u64>,
}

impl DownloadSession {
    pub fn new(request: MediaRequest, resolved: &ResolvedMedia) -> Self {
        Self {
            request,
            direct_url: resolved.direct_url.clone(),
            filename: resolved.filename.clone(),
            bytes_received: 0,
            total_bytes: None,
        }
    }
}

/// Point-in-time view for front-ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// 0..=100, monotonic within a session.
    pub progress: f64,
    pub kind: MediaKind,
    pub metadata: Option<MediaMetadata>,
    pub session: Option<DownloadSession>,
    pub error_message: Option<String>,
    /// Bumped on every state change; used to tell whether an error was superseded.
    pub version: u64,
}

impl SessionSnapshot {
    pub fn status_text(&self) -> String {
        match self.state {
            SessionState::Error => self
                .error_message
                .clone()
                .unwrap_or_else(|| SessionState::Error.status_text().to_string()),
            SessionState::Downloading => format!(
                "{} {}",
                SessionState::Downloading.status_text(),
                format_progress(self.progress)
            ),
            other => other.status_text().to_string(),
        }
    }
}

/// Change notifications, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    State(SessionState),
    Progress(ProgressUpdate),
    Metadata(MediaMetadata),
    Resolved(ResolvedMedia),
    /// In-process fetch failed; the direct URL went to the system handler.
    OpenedExternally { direct_url: String },
    Saved { path: PathBuf },
    Error { message: String },
}

pub(super) struct Shared {
    control: SessionControl,
    snapshot: Mutex<SessionSnapshot>,
    events: Mutex<Option<UnboundedSender<PipelineEvent>>>,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            control: SessionControl::new(),
            snapshot: Mutex::new(SessionSnapshot::default()),
            events: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionSnapshot> {
        self.snapshot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().clone()
    }

    /// Replaces the event subscriber; the previous receiver sees its channel close.
    pub fn subscribe(&self) -> UnboundedReceiver<PipelineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        rx
    }

    fn emit(&self, events: Vec<PipelineEvent>) {
        let guard = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = guard.as_ref() {
            for event in events {
                // Receiver gone: nobody is watching.
                let _ = tx.send(event);
            }
        }
    }

    /// Tears down whatever is running and starts a new session in `Analyzing`.
    pub fn begin(&self, kind: MediaKind) -> SessionTicket {
        let mut snap = self.lock();
        let ticket = self.control.begin();
        let mut events = Vec::new();
        if snap.state != SessionState::Idle && !snap.state.accepts_new_request() {
            events.push(set_state(&mut snap, SessionState::Idle));
        }
        clear(&mut snap);
        snap.kind = kind;
        events.push(set_state(&mut snap, SessionState::Analyzing));
        self.emit(events);
        ticket
    }

    /// Runs `f` if `ticket` is still the live session. Returns whether it ran.
    pub fn apply<F>(&self, ticket: &SessionTicket, f: F) -> bool
    where
        F: FnOnce(&mut SessionSnapshot) -> Vec<PipelineEvent>,
    {
        let mut snap = self.lock();
        if !self.control.is_current(ticket.generation) || ticket.token.is_cancelled() {
            return false;
        }
        let events = f(&mut snap);
        self.emit(events);
        true
    }

    pub fn transition(&self, ticket: &SessionTicket, next: SessionState) -> bool {
        self.apply(ticket, |snap| vec![set_state(snap, next)])
    }

    /// Records a progress update, never letting the percentage go backwards.
    pub fn record_progress(&self, ticket: &SessionTicket, update: ProgressUpdate) {
        self.apply(ticket, |snap| {
            snap.progress = snap.progress.max(update.percent);
            if let Some(session) = snap.session.as_mut() {
                session.bytes_received = update.bytes_received;
                session.total_bytes = update.total_bytes;
            }
            vec![PipelineEvent::Progress(ProgressUpdate {
                percent: snap.progress,
                ..update
            })]
        });
    }

    /// Progress 100 and `Completed`.
    pub fn complete(&self, ticket: &SessionTicket, extra: Vec<PipelineEvent>) -> bool {
        self.apply(ticket, |snap| {
            snap.progress = COMPLETE;
            let (bytes_received, total_bytes) = snap
                .session
                .as_ref()
                .map(|s| (s.bytes_received, s.total_bytes))
                .unwrap_or((0, None));
            let mut events = extra;
            events.push(PipelineEvent::Progress(ProgressUpdate {
                percent: COMPLETE,
                bytes_received,
                total_bytes,
            }));
            events.push(set_state(snap, SessionState::Completed));
            events
        })
    }

    /// Moves the live session to `Error`. Returns the snapshot version to
    /// revert from, or None if the session is no longer live.
    pub fn fail(&self, ticket: &SessionTicket, message: &str) -> Option<u64> {
        let mut version = None;
        self.apply(ticket, |snap| {
            let events = enter_error(snap, message);
            version = Some(snap.version);
            events
        });
        self.control.finish(ticket);
        version
    }

    /// Error raised before any session exists (rejected input). Tears down
    /// whatever was running first.
    pub fn fail_untracked(&self, message: &str) -> u64 {
        let mut snap = self.lock();
        self.control.cancel_active();
        let mut events = Vec::new();
        if snap.state != SessionState::Idle {
            events.push(set_state(&mut snap, SessionState::Idle));
        }
        clear(&mut snap);
        events.extend(enter_error(&mut snap, message));
        let version = snap.version;
        self.emit(events);
        version
    }

    /// `Error → Idle` unless something happened since `version`.
    pub fn revert_error(&self, version: u64) -> bool {
        let mut snap = self.lock();
        if snap.version != version || snap.state != SessionState::Error {
            return false;
        }
        snap.error_message = None;
        let event = set_state(&mut snap, SessionState::Idle);
        self.emit(vec![event]);
        true
    }

    /// Live session abandoned by its own flow (save chooser dismissed).
    pub fn abandon(&self, ticket: &SessionTicket) {
        self.apply(ticket, |snap| {
            clear(snap);
            vec![set_state(snap, SessionState::Idle)]
        });
        self.control.finish(ticket);
    }

    /// Aborts the active session. With `force`, also clears a finished or
    /// failed session. Returns whether anything changed.
    pub fn stop(&self, force: bool) -> bool {
        let mut snap = self.lock();
        let had_session = self.control.cancel_active();
        if !had_session && !force && !snap.state.is_working() {
            return false;
        }
        clear(&mut snap);
        if snap.state != SessionState::Idle {
            let event = set_state(&mut snap, SessionState::Idle);
            self.emit(vec![event]);
        }
        true
    }

    pub fn finish(&self, ticket: &SessionTicket) {
        self.control.finish(ticket);
    }

    pub fn select_kind(&self, kind: MediaKind) -> Result<(), SessionState> {
        let mut snap = self.lock();
        if !snap.state.accepts_new_request() {
            return Err(snap.state);
        }
        snap.kind = kind;
        Ok(())
    }
}

fn set_state(snap: &mut SessionSnapshot, next: SessionState) -> PipelineEvent {
    if !snap.state.can_transition_to(next) {
        tracing::warn!(from = %snap.state, to = %next, "unexpected session state transition");
    }
    tracing::debug!(from = %snap.state, to = %next, "session state");
    snap.state = next;
    snap.version += 1;
    PipelineEvent::State(next)
}

fn enter_error(snap: &mut SessionSnapshot, message: &str) -> Vec<PipelineEvent> {
    snap.session = None;
    snap.error_message = Some(message.to_string());
    vec![
        set_state(snap, SessionState::Error),
        PipelineEvent::Error {
            message: message.to_string(),
        },
    ]
}

fn clear(snap: &mut SessionSnapshot) {
    snap.progress = 0.0;
    snap.metadata = None;
    snap.session = None;
    snap.error_message = None;
}
