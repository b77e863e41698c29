//! Output streaming
//!
//! Each open shell gets two reader tasks (stdout and stderr) and one relay
//! task:
//!
//! ```text
//! stdout reader --String-------> \
//!                                 relay --SessionEvent--> UI loop
//! stderr reader --SessionError-> /
//! ```
//!
//! Readers pull fixed-size chunks, sanitise them and forward non-empty text.
//! End-of-stream ends a reader quietly; any other read error is forwarded
//! and ends that reader. Chunks from one stream arrive in read order; there
//! is no ordering between stdout and stderr.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::error::SessionError;
use super::manager::SessionEvent;
use crate::config::OutputVisibility;
use crate::primitives::ansi::OutputSanitizer;

/// Bytes requested per read
pub const READ_CHUNK: usize = 1024;
/// Chunks buffered per session before readers wait for the relay
const CHANNEL_DEPTH: usize = 256;

/// Shared switch deciding whether read output is forwarded.
///
/// Closed until the shell has started. Under [`OutputVisibility::All`] it
/// opens once startup is done and stays open. Under
/// [`OutputVisibility::LastCommand`] each batch closes it and it opens again
/// right before the batch's last command is written.
#[derive(Debug, Clone)]
pub struct OutputGate {
    open: Arc<AtomicBool>,
    policy: OutputVisibility,
}

impl OutputGate {
    pub fn new(policy: OutputVisibility) -> Self {
        Self {
            open: Arc::new(AtomicBool::new(false)),
            policy,
        }
    }

    pub fn policy(&self) -> OutputVisibility {
        self.policy
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn startup_complete(&self) {
        if self.policy == OutputVisibility::All {
            self.open.store(true, Ordering::Release);
        }
    }

    pub fn batch_started(&self) {
        if self.policy == OutputVisibility::LastCommand {
            self.open.store(false, Ordering::Release);
        }
    }

    pub fn last_command_starting(&self) {
        self.open.store(true, Ordering::Release);
    }
}

/// Per-session receiving ends produced by [`start_streaming`]
pub struct StreamChannels {
    pub output: mpsc::Receiver<String>,
    pub errors: mpsc::Receiver<SessionError>,
    pub readers: [JoinHandle<()>; 2],
}

/// Spawn the stdout and stderr readers for one shell
pub fn start_streaming<R1, R2>(stdout: R1, stderr: R2, gate: OutputGate) -> StreamChannels
where
    R1: AsyncRead + Send + Unpin + 'static,
    R2: AsyncRead + Send + Unpin + 'static,
{
    let (output_tx, output) = mpsc::channel(CHANNEL_DEPTH);
    let (error_tx, errors) = mpsc::channel(CHANNEL_DEPTH);

    let readers = [
        tokio::spawn(read_stream(
            stdout,
            gate.clone(),
            output_tx.clone(),
            error_tx.clone(),
        )),
        tokio::spawn(read_stream(stderr, gate, output_tx, error_tx)),
    ];

    StreamChannels {
        output,
        errors,
        readers,
    }
}

async fn read_stream<R>(
    mut reader: R,
    gate: OutputGate,
    output: mpsc::Sender<String>,
    errors: mpsc::Sender<SessionError>,
) where
    R: AsyncRead + Unpin,
{
    let mut sanitizer = OutputSanitizer::new();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let text = sanitizer.feed(&buf[..n]);
                if text.is_empty() || !gate.is_open() {
                    continue;
                }
                if output.send(text).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = errors
                    .send(SessionError::Io(format!("read error: {e}")))
                    .await;
                break;
            }
        }
    }
}

/// Forward one session's output and errors to the UI as discrete events.
///
/// Ends once both readers are gone or the UI side has hung up.
pub fn spawn_relay(
    index: usize,
    mut output: mpsc::Receiver<String>,
    mut errors: mpsc::Receiver<SessionError>,
    sender: std_mpsc::Sender<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut output_open = true;
        let mut errors_open = true;
        while output_open || errors_open {
            let event = tokio::select! {
                text = output.recv(), if output_open => match text {
                    Some(text) => SessionEvent::Output { index, text },
                    None => {
                        output_open = false;
                        continue;
                    }
                },
                error = errors.recv(), if errors_open => match error {
                    Some(error) => {
                        tracing::warn!(session = index, "Stream error: {}", error);
                        SessionEvent::StreamError { index, error }
                    }
                    None => {
                        errors_open = false;
                        continue;
                    }
                },
            };
            if sender.send(event).is_err() {
                break;
            }
        }
        tracing::debug!(session = index, "Output relay finished");
    })
}
