//! Session state machine shared with the UI layer.

use std::fmt;

/// `idle → analyzing → waiting_for_save → downloading → converting → completed`,
/// with `error` reachable from every working state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Analyzing,
    WaitingForSave,
    Downloading,
    Converting,
    Completed,
    Error,
}

impl SessionState {
    /// States from which a new request may start or the media kind may change.
    pub fn accepts_new_request(self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Completed)
    }

    /// True while a session is doing work (network, dialog, save).
    pub fn is_working(self) -> bool {
        matches!(
            self,
            SessionState::Analyzing
                | SessionState::WaitingForSave
                | SessionState::Downloading
                | SessionState::Converting
        )
    }

    /// Whether `self → next` is a legal step within one session.
    /// Any state may drop back to `Idle` (cancel, reset, error timeout).
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        if next == Idle {
            return true;
        }
        match (self, next) {
            (Idle | Completed, Analyzing) => true,
            (Analyzing, WaitingForSave | Downloading | Error) => true,
            (WaitingForSave, Downloading | Error) => true,
            // Completed straight from Downloading is the open-externally fallback.
            (Downloading, Converting | Completed | Error) => true,
            (Converting, Completed | Error) => true,
            (Idle, Error) => true,
            _ => false,
        }
    }

    /// Short status line for display.
    pub fn status_text(self) -> &'static str {
        match self {
            SessionState::Idle => "",
            SessionState::Analyzing => "Resolving link...",
            SessionState::WaitingForSave => "Choose where to save...",
            SessionState::Downloading => "Downloading...",
            SessionState::Converting => "Finishing up...",
            SessionState::Completed => "Done!",
            SessionState::Error => "Error",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Analyzing => "analyzing",
            SessionState::WaitingForSave => "waiting_for_save",
            SessionState::Downloading => "downloading",
            SessionState::Converting => "converting",
            SessionState::Completed => "completed",
            SessionState::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// `round(percent)%`, e.g. `"42%"`.
pub fn format_progress(percent: f64) -> String {
    format!("{}%", percent.round() as i64)
}
