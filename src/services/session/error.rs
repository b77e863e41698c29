use std::time::Duration;

use super::state::SessionState;

/// Everything that can go wrong with one session.
///
/// Errors never leave their session: they end up as a message in that
/// session's tab and never affect other tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No usable credential, unreadable key, or rejected by the server
    Auth(String),
    /// TCP connect or SSH handshake failed
    Dial(String),
    /// Connect did not finish within the configured timeout
    Timeout(Duration),
    /// Opening the shell or reading its output failed
    Io(String),
    /// Writing a command to the shell failed
    CommandSend(String),
    /// Operation not allowed in the current state
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}

/// Coarse classification used to decide how a failure is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Dial,
    SessionIo,
    CommandSend,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Auth(_) => ErrorKind::Auth,
            SessionError::Dial(_) | SessionError::Timeout(_) => ErrorKind::Dial,
            SessionError::Io(_) | SessionError::InvalidState { .. } => ErrorKind::SessionIo,
            SessionError::CommandSend(_) => ErrorKind::CommandSend,
        }
    }

    /// Whether the session is unusable afterwards
    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::SessionIo)
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Auth(msg) => write!(f, "authentication failed: {msg}"),
            SessionError::Dial(msg) => write!(f, "failed to dial: {msg}"),
            SessionError::Timeout(after) => {
                write!(f, "failed to dial: timed out after {}s", after.as_secs())
            }
            SessionError::Io(msg) => f.write_str(msg),
            SessionError::CommandSend(msg) => write!(f, "failed to send command: {msg}"),
            SessionError::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while {state}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
