//! One remote connection and its interactive shell

use tokio::io::AsyncWriteExt;

use super::error::SessionError;
use super::state::SessionState;
use super::stream::OutputGate;
use super::transport::{BoxedReader, BoxedWriter, Connection, Connector, PtySize};
use crate::config::{ServerTarget, SessionSettings};

/// Command written after the shell starts to wipe login banners
const CLEAR_COMMAND: &str = "clear\n";

pub struct Session {
    index: usize,
    target: ServerTarget,
    settings: SessionSettings,
    state: SessionState,
    connection: Option<Box<dyn Connection>>,
    stdin: Option<BoxedWriter>,
    gate: OutputGate,
}

impl Session {
    pub fn new(index: usize, target: ServerTarget, settings: SessionSettings) -> Self {
        let gate = OutputGate::new(settings.output_visibility);
        Self {
            index,
            target,
            settings,
            state: SessionState::Disconnected,
            connection: None,
            stdin: None,
            gate,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn target(&self) -> &ServerTarget {
        &self.target
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn gate(&self) -> &OutputGate {
        &self.gate
    }

    fn transition(&mut self, next: SessionState) {
        if self.state.can_transition_to(next) {
            tracing::debug!(
                session = self.index,
                "{}: {} -> {}",
                self.target.name,
                self.state,
                next
            );
            self.state = next;
        }
    }

    fn expect_state(
        &self,
        operation: &'static str,
        expected: SessionState,
    ) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Dial and authenticate.
    ///
    /// A private key is preferred over a password; a target with neither
    /// fails without touching the network.
    pub async fn connect(&mut self, connector: &dyn Connector) -> Result<(), SessionError> {
        self.expect_state("connect", SessionState::Disconnected)?;
        self.transition(SessionState::Connecting);

        let result = match self.target.credential() {
            None => Err(SessionError::Auth(
                "neither private key path nor password provided".to_string(),
            )),
            Some(credential) => {
                let timeout = self.settings.connect_timeout();
                match tokio::time::timeout(timeout, connector.connect(&self.target, &credential))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(SessionError::Timeout(timeout)),
                }
            }
        };

        match result {
            Ok(connection) => {
                self.connection = Some(connection);
                self.transition(SessionState::Ready);
                tracing::info!(
                    session = self.index,
                    "Connected to {} ({})",
                    self.target.name,
                    self.target.address()
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    session = self.index,
                    "Connection to {} failed: {}",
                    self.target.name,
                    e
                );
                self.transition(SessionState::Failed);
                Err(e)
            }
        }
    }

    /// Open the interactive shell and return its stdout and stderr.
    ///
    /// stdin is kept by the session for [`Session::run_commands`].
    pub async fn open_stream(
        &mut self,
        pty: PtySize,
    ) -> Result<(BoxedReader, BoxedReader), SessionError> {
        self.expect_state("open a shell", SessionState::Ready)?;
        if self.stdin.is_some() {
            return Err(SessionError::Io("shell already open".to_string()));
        }
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| SessionError::Io("no connection".to_string()))?;

        let streams = connection.open_shell(pty).await?;
        self.stdin = Some(streams.stdin);
        tracing::debug!(session = self.index, "Shell open ({}x{})", pty.cols, pty.rows);
        Ok((streams.stdout, streams.stderr))
    }

    /// Let the shell settle and optionally clear the screen, then let
    /// output through.
    ///
    /// A failed `clear` is reported but does not stop the session.
    pub async fn prepare(&mut self) -> Result<(), SessionError> {
        let result = self.prepare_shell().await;
        self.gate.startup_complete();
        result
    }

    async fn prepare_shell(&mut self) -> Result<(), SessionError> {
        tokio::time::sleep(self.settings.startup_delay()).await;
        if !self.settings.clear_on_start {
            return Ok(());
        }
        if let Some(stdin) = self.stdin.as_mut() {
            write_line(stdin, CLEAR_COMMAND)
                .await
                .map_err(|e| SessionError::Io(format!("failed to clear terminal: {e}")))?;
        }
        tokio::time::sleep(self.settings.settle_delay()).await;
        Ok(())
    }

    /// Write each command to the shell in order, pausing between them.
    ///
    /// A write failure releases the connection and fails the session.
    pub async fn run_commands(&mut self, commands: &[String]) -> Result<(), SessionError> {
        if commands.is_empty() {
            return Ok(());
        }
        self.expect_state("run commands", SessionState::Ready)?;
        if self.stdin.is_none() {
            return Err(SessionError::Io("shell not open".to_string()));
        }

        self.transition(SessionState::Running);
        self.gate.batch_started();

        let last = commands.len() - 1;
        for (i, command) in commands.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settings.command_delay()).await;
            }
            if i == last {
                self.gate.last_command_starting();
            }

            let line = if command.ends_with('\n') {
                command.clone()
            } else {
                format!("{command}\n")
            };

            let written = match self.stdin.as_mut() {
                Some(stdin) => write_line(stdin, &line).await,
                None => Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe)),
            };
            if let Err(e) = written {
                let error = SessionError::CommandSend(e.to_string());
                tracing::error!(
                    session = self.index,
                    "Command {} on {} failed: {}",
                    i + 1,
                    self.target.name,
                    error
                );
                self.release().await;
                self.transition(SessionState::Failed);
                return Err(error);
            }
            tracing::debug!(session = self.index, "Sent command {}/{}", i + 1, commands.len());
        }

        self.transition(SessionState::Ready);
        Ok(())
    }

    /// Release the shell and connection. Idempotent.
    pub async fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.release().await;
        self.transition(SessionState::Closed);
        tracing::info!(session = self.index, "Closed session to {}", self.target.name);
    }

    async fn release(&mut self) {
        if let Some(mut stdin) = self.stdin.take() {
            let _ = stdin.shutdown().await;
        }
        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
        }
    }
}

async fn write_line(stdin: &mut BoxedWriter, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await
}
