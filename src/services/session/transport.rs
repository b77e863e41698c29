//! Seam between session orchestration and the wire protocol
//!
//! A [`Connector`] dials and authenticates; the resulting [`Connection`]
//! opens one interactive shell and hands back its three byte streams. The
//! production implementation lives in `russh_transport`; tests plug in an
//! in-memory one.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::error::SessionError;
use crate::config::{Credential, ServerTarget};

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Pseudo-terminal dimensions requested for the remote shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtySize {
    pub cols: u32,
    pub rows: u32,
}

impl Default for PtySize {
    fn default() -> Self {
        Self { cols: 80, rows: 40 }
    }
}

/// Byte streams of an open shell
pub struct RemoteStreams {
    pub stdout: BoxedReader,
    pub stderr: BoxedReader,
    pub stdin: BoxedWriter,
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Dial `target` and authenticate with `credential`.
    ///
    /// Timeouts are applied by the caller.
    async fn connect(
        &self,
        target: &ServerTarget,
        credential: &Credential,
    ) -> Result<Box<dyn Connection>, SessionError>;
}

#[async_trait]
pub trait Connection: Send {
    async fn open_shell(&mut self, pty: PtySize) -> Result<RemoteStreams, SessionError>;

    /// Release the connection. Readers of already opened streams see
    /// end-of-stream afterwards.
    async fn close(&mut self);
}
