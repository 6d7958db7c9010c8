//! Session cancellation: shared abort tokens and the single active-session slot.
//!
//! Each session gets a fresh [`CancelToken`]. Blocking curl transfers poll the
//! token from their write and progress callbacks and abort as soon as it is set.
//! [`SessionControl`] holds the token of the one active session; beginning a
//! new session cancels the previous one first.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Error returned when a transfer is stopped because its token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cancelled by user")
    }
}

impl std::error::Error for Cancelled {}

/// Cloneable cancellation flag shared between the caller and a transfer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the token has been cancelled.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Handle to a session registered with [`SessionControl`].
#[derive(Debug, Clone)]
pub struct SessionTicket {
    pub generation: u64,
    pub token: CancelToken,
}

/// The single active-session slot.
#[derive(Debug, Default)]
pub struct SessionControl {
    active: Mutex<Option<(u64, CancelToken)>>,
    generation: AtomicU64,
}

impl SessionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the current session (if any) and registers a new one.
    pub fn begin(&self) -> SessionTicket {
        let token = CancelToken::new();
        let mut slot = self.active.lock().unwrap_or_else(|e| e.into_inner());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((_, prev)) = slot.replace((generation, token.clone())) {
            prev.cancel();
        }
        SessionTicket { generation, token }
    }

    /// Cancels the active session, leaving the slot empty. Returns true if one was active.
    pub fn cancel_active(&self) -> bool {
        let mut slot = self.active.lock().unwrap_or_else(|e| e.into_inner());
        match slot.take() {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Clears the slot if `ticket` is still the active session (call when it finishes).
    pub fn finish(&self, ticket: &SessionTicket) {
        let mut slot = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(*slot, Some((generation, _)) if generation == ticket.generation) {
            slot.take();
        }
    }

    /// True if no newer session was begun after `generation`.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}
