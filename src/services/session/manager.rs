//! Fan-out of sessions across all configured targets
//!
//! Every target gets its own worker task that owns its [`Session`]. The UI
//! thread talks to a worker only through its [`SessionHandle`] and hears
//! back only through [`SessionEvent`]s on a `std::sync::mpsc` channel, so no
//! task ever touches UI state.

use std::collections::VecDeque;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::error::SessionError;
use super::session::Session;
use super::stream::{spawn_relay, start_streaming};
use super::transport::{Connector, PtySize};
use crate::config::{ServerTarget, SessionSettings};

/// How long a worker waits for its readers after closing the connection
const READER_GRACE: Duration = Duration::from_secs(2);

/// Messages from session workers to the UI loop
#[derive(Debug)]
pub enum SessionEvent {
    Connected {
        index: usize,
        handle: SessionHandle,
    },
    ConnectFailed {
        index: usize,
        error: SessionError,
    },
    Output {
        index: usize,
        text: String,
    },
    /// Non-terminal read or shell error, shown inline
    StreamError {
        index: usize,
        error: SessionError,
    },
    /// Writing a command failed; the session is gone
    CommandFailed {
        index: usize,
        error: SessionError,
    },
}

impl SessionEvent {
    pub fn index(&self) -> usize {
        match self {
            SessionEvent::Connected { index, .. }
            | SessionEvent::ConnectFailed { index, .. }
            | SessionEvent::Output { index, .. }
            | SessionEvent::StreamError { index, .. }
            | SessionEvent::CommandFailed { index, .. } => *index,
        }
    }
}

#[derive(Debug)]
enum Control {
    RunCommands(Vec<String>),
    Close,
}

/// UI-side handle to one session worker
#[derive(Debug, Clone)]
pub struct SessionHandle {
    index: usize,
    control: mpsc::UnboundedSender<Control>,
}

impl SessionHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Queue a command batch. Returns false if the worker has already exited.
    pub fn run_commands(&self, commands: Vec<String>) -> bool {
        self.control.send(Control::RunCommands(commands)).is_ok()
    }

    /// Ask the worker to close its session. Safe to call repeatedly.
    pub fn close(&self) {
        let _ = self.control.send(Control::Close);
    }

    pub fn is_closed(&self) -> bool {
        self.control.is_closed()
    }
}

pub struct SessionManager {
    runtime: Handle,
    connector: Arc<dyn Connector>,
    settings: SessionSettings,
    pty: PtySize,
    sender: std_mpsc::Sender<SessionEvent>,
    handles: Vec<SessionHandle>,
    workers: Vec<JoinHandle<()>>,
}

impl SessionManager {
    pub fn new(
        runtime: Handle,
        connector: Arc<dyn Connector>,
        settings: SessionSettings,
        sender: std_mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            runtime,
            connector,
            settings,
            pty: PtySize::default(),
            sender,
            handles: Vec::new(),
            workers: Vec::new(),
        }
    }

    pub fn with_pty_size(mut self, pty: PtySize) -> Self {
        self.pty = pty;
        self
    }

    pub fn session_count(&self) -> usize {
        self.handles.len()
    }

    /// Start one independent worker per target.
    ///
    /// Results arrive as `Connected` / `ConnectFailed` events in whatever
    /// order the connections finish. Indices follow `targets`.
    pub fn connect_all(&mut self, targets: &[ServerTarget]) {
        for target in targets {
            let index = self.handles.len();
            let (control_tx, control_rx) = mpsc::unbounded_channel();
            let handle = SessionHandle {
                index,
                control: control_tx,
            };

            let session = Session::new(index, target.clone(), self.settings.clone());
            let worker = run_worker(
                session,
                Arc::clone(&self.connector),
                self.pty,
                control_rx,
                handle.clone(),
                self.sender.clone(),
            );
            self.workers.push(self.runtime.spawn(worker));
            self.handles.push(handle);
            tracing::debug!(session = index, "Spawned worker for {}", target.name);
        }
    }

    /// Ask every worker to close its session
    pub fn close_all(&self) {
        for handle in &self.handles {
            handle.close();
        }
    }

    /// Close everything and wait up to `grace` for workers to finish
    pub async fn shutdown(&mut self, grace: Duration) {
        self.close_all();
        let workers = std::mem::take(&mut self.workers);
        let waited = tokio::time::timeout(grace, async move {
            for worker in workers {
                let _ = worker.await;
            }
        })
        .await;
        if waited.is_err() {
            tracing::warn!("Session workers still running after {:?}", grace);
        }
    }
}

/// Resolves once a close is requested or every handle is gone. Batches
/// that arrive meanwhile are queued on `pending` in order.
async fn close_requested(
    control: &mut mpsc::UnboundedReceiver<Control>,
    pending: &mut VecDeque<Vec<String>>,
) {
    while let Some(message) = control.recv().await {
        match message {
            Control::RunCommands(commands) => pending.push_back(commands),
            Control::Close => return,
        }
    }
}

/// Next batch to run, or `None` once the worker should close
async fn next_batch(
    control: &mut mpsc::UnboundedReceiver<Control>,
    pending: &mut VecDeque<Vec<String>>,
) -> Option<Vec<String>> {
    if let Some(commands) = pending.pop_front() {
        return Some(commands);
    }
    match control.recv().await {
        Some(Control::RunCommands(commands)) => Some(commands),
        Some(Control::Close) | None => None,
    }
}

async fn run_worker(
    mut session: Session,
    connector: Arc<dyn Connector>,
    pty: PtySize,
    mut control: mpsc::UnboundedReceiver<Control>,
    handle: SessionHandle,
    sender: std_mpsc::Sender<SessionEvent>,
) {
    let index = session.index();
    let mut pending = VecDeque::new();

    let connected = tokio::select! {
        result = session.connect(connector.as_ref()) => result,
        _ = close_requested(&mut control, &mut pending) => {
            session.close().await;
            return;
        }
    };
    if let Err(error) = connected {
        let _ = sender.send(SessionEvent::ConnectFailed { index, error });
        return;
    }
    let _ = sender.send(SessionEvent::Connected { index, handle });

    let (stdout, stderr) = match session.open_stream(pty).await {
        Ok(streams) => streams,
        Err(error) => {
            tracing::warn!(session = index, "Failed to open shell: {}", error);
            let _ = sender.send(SessionEvent::StreamError { index, error });
            session.close().await;
            return;
        }
    };

    let channels = start_streaming(stdout, stderr, session.gate().clone());
    let relay = spawn_relay(index, channels.output, channels.errors, sender.clone());

    // Startup delays and batches are abandoned as soon as a close arrives
    let prepared = tokio::select! {
        result = session.prepare() => {
            if let Err(error) = result {
                let _ = sender.send(SessionEvent::StreamError { index, error });
            }
            true
        }
        _ = close_requested(&mut control, &mut pending) => false,
    };

    if prepared {
        while let Some(commands) = next_batch(&mut control, &mut pending).await {
            let result = tokio::select! {
                result = session.run_commands(&commands) => result,
                _ = close_requested(&mut control, &mut pending) => {
                    tracing::debug!(session = index, "Close requested mid-batch");
                    break;
                }
            };
            if let Err(error) = result {
                if error.is_terminal() {
                    let _ = sender.send(SessionEvent::CommandFailed { index, error });
                    break;
                }
                let _ = sender.send(SessionEvent::StreamError { index, error });
            }
        }
    }

    session.close().await;

    // Closing the connection ends both readers, which ends the relay
    let mut readers = channels.readers;
    let drained = tokio::time::timeout(READER_GRACE, async {
        for reader in readers.iter_mut() {
            let _ = reader.await;
        }
    })
    .await;
    if drained.is_err() {
        tracing::debug!(session = index, "Readers did not see end-of-stream, aborting");
        for reader in &readers {
            reader.abort();
        }
    }
    let _ = relay.await;
    tracing::debug!(session = index, "Worker finished");
}
