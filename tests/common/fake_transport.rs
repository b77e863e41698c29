//! In-memory stand-in for the SSH transport
//!
//! Every accepted connection runs a tiny "shell" that prints a banner, then
//! echoes each received line back as `{host}: {line}`. `clear` produces a
//! screen-clear escape sequence instead, which the sanitizer drops.

use async_trait::async_trait;
use herd::config::{Credential, ServerTarget};
use herd::services::session::{Connection, Connector, PtySize, RemoteStreams, SessionError};
use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const PIPE_CAPACITY: usize = 64 * 1024;

/// How the fake server treats a host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Accept,
    RejectAuth,
    Unreachable,
    /// Never answers; only a timeout or close ends the attempt
    Hang,
    /// Accepts, but writing to the shell fails
    BrokenStdin,
}

/// One line received by a fake shell
#[derive(Debug, Clone)]
pub struct Received {
    pub line: String,
    pub at: Instant,
}

#[derive(Default)]
struct Shared {
    received: HashMap<String, Vec<Received>>,
    credentials: HashMap<String, Credential>,
    opened: usize,
    closed: usize,
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    behaviours: HashMap<String, Behaviour>,
    shared: Arc<Mutex<Shared>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the behaviour for `host`; unlisted hosts are accepted
    pub fn with(mut self, host: &str, behaviour: Behaviour) -> Self {
        self.behaviours.insert(host.to_string(), behaviour);
        self
    }

    pub fn received(&self, host: &str) -> Vec<Received> {
        self.shared
            .lock()
            .unwrap()
            .received
            .get(host)
            .cloned()
            .unwrap_or_default()
    }

    pub fn received_lines(&self, host: &str) -> Vec<String> {
        self.received(host).into_iter().map(|r| r.line).collect()
    }

    pub fn credential(&self, host: &str) -> Option<Credential> {
        self.shared.lock().unwrap().credentials.get(host).cloned()
    }

    pub fn opened(&self) -> usize {
        self.shared.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.shared.lock().unwrap().closed
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        target: &ServerTarget,
        credential: &Credential,
    ) -> Result<Box<dyn Connection>, SessionError> {
        let behaviour = self
            .behaviours
            .get(&target.host)
            .copied()
            .unwrap_or(Behaviour::Accept);

        match behaviour {
            Behaviour::RejectAuth => Err(SessionError::Auth("permission denied".into())),
            Behaviour::Unreachable => Err(SessionError::Dial("connection refused".into())),
            Behaviour::Hang => std::future::pending().await,
            Behaviour::Accept | Behaviour::BrokenStdin => {
                let mut shared = self.shared.lock().unwrap();
                shared
                    .credentials
                    .insert(target.host.clone(), credential.clone());
                shared.opened += 1;
                Ok(Box::new(FakeConnection {
                    host: target.host.clone(),
                    broken_stdin: behaviour == Behaviour::BrokenStdin,
                    shared: Arc::clone(&self.shared),
                    shell: None,
                    closed: false,
                }))
            }
        }
    }
}

struct FakeConnection {
    host: String,
    broken_stdin: bool,
    shared: Arc<Mutex<Shared>>,
    shell: Option<JoinHandle<()>>,
    closed: bool,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn open_shell(&mut self, _pty: PtySize) -> Result<RemoteStreams, SessionError> {
        let (mut stdout_remote, stdout_local) = tokio::io::duplex(PIPE_CAPACITY);
        let (stderr_remote, stderr_local) = tokio::io::duplex(PIPE_CAPACITY);
        let (stdin_local, stdin_remote) = tokio::io::duplex(PIPE_CAPACITY);

        stdout_remote
            .write_all(format!("Welcome to {}\r\n", self.host).as_bytes())
            .await
            .map_err(|e| SessionError::Io(e.to_string()))?;

        self.shell = Some(tokio::spawn(run_shell(
            self.host.clone(),
            Arc::clone(&self.shared),
            stdin_remote,
            stdout_remote,
            stderr_remote,
        )));

        let stdin: herd::services::session::BoxedWriter = if self.broken_stdin {
            Box::new(BrokenPipe)
        } else {
            Box::new(stdin_local)
        };

        Ok(RemoteStreams {
            stdout: Box::new(stdout_local),
            stderr: Box::new(stderr_local),
            stdin,
        })
    }

    async fn close(&mut self) {
        if let Some(shell) = self.shell.take() {
            shell.abort();
        }
        if !self.closed {
            self.closed = true;
            self.shared.lock().unwrap().closed += 1;
        }
    }
}

async fn run_shell(
    host: String,
    shared: Arc<Mutex<Shared>>,
    stdin: DuplexStream,
    mut stdout: DuplexStream,
    mut stderr: DuplexStream,
) {
    let mut lines = BufReader::new(stdin).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        shared
            .lock()
            .unwrap()
            .received
            .entry(host.clone())
            .or_default()
            .push(Received {
                line: line.clone(),
                at: Instant::now(),
            });

        let reply = match line.as_str() {
            "clear" => "\x1b[H\x1b[2J".to_string(),
            "fail" => {
                let _ = stderr.write_all(b"command failed\r\n").await;
                continue;
            }
            _ => format!("{}: {}\r\n", host, line),
        };
        if stdout.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }
}

/// Writer whose every write fails
struct BrokenPipe;

impl AsyncWrite for BrokenPipe {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
