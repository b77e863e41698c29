//! Lifecycle of one remote session
//!
//! ```text
//! Disconnected -> Connecting -> Ready <-> Running
//!        any non-terminal state -> Closed | Failed
//! ```
//!
//! `Closed` and `Failed` are terminal.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Ready,
    Running,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }

    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, Closed | Failed) => true,
            (Disconnected, Connecting) => true,
            (Connecting, Ready) => true,
            (Ready, Running) => true,
            (Running, Ready) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Ready => "ready",
            SessionState::Running => "running",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
