//! SSH transport over `russh`
//!
//! russh multiplexes stdout, stderr and stdin over a single channel. A pump
//! task owns the channel and bridges it to three in-memory pipes, so the
//! rest of the session code sees ordinary independent streams.

use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect, Pty};
use russh_keys::key::PublicKey;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

use super::error::SessionError;
use super::transport::{Connection, Connector, PtySize, RemoteStreams};
use crate::config::{Credential, ServerTarget};

/// Buffer size of each in-memory pipe
const PIPE_CAPACITY: usize = 64 * 1024;
/// SSH extended-data type code for stderr
const EXTENDED_DATA_STDERR: u32 = 1;
const TERMINAL_SPEED: u32 = 14400;

/// Accepts every host key
struct ClientHandler;

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

#[derive(Debug, Default)]
pub struct RusshConnector;

impl RusshConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for RusshConnector {
    async fn connect(
        &self,
        target: &ServerTarget,
        credential: &Credential,
    ) -> Result<Box<dyn Connection>, SessionError> {
        let config = Arc::new(client::Config::default());
        let mut handle = client::connect(
            config,
            (target.host.as_str(), target.port),
            ClientHandler,
        )
        .await
        .map_err(|e| SessionError::Dial(e.to_string()))?;

        let accepted = match credential {
            Credential::PrivateKey(path) => {
                let key = russh_keys::load_secret_key(path, None).map_err(|e| {
                    SessionError::Auth(format!(
                        "unable to read private key {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                handle
                    .authenticate_publickey(target.user.clone(), Arc::new(key))
                    .await
            }
            Credential::Password(password) => {
                handle
                    .authenticate_password(target.user.clone(), password.clone())
                    .await
            }
        }
        .map_err(|e| SessionError::Auth(e.to_string()))?;

        if !accepted {
            let _ = handle
                .disconnect(Disconnect::ByApplication, "", "en")
                .await;
            return Err(SessionError::Auth(format!(
                "server rejected credentials for {}",
                target.user
            )));
        }

        tracing::debug!("Authenticated as {} on {}", target.user, target.address());
        Ok(Box::new(RusshConnection {
            handle: Some(handle),
            pump: None,
        }))
    }
}

pub struct RusshConnection {
    handle: Option<Handle<ClientHandler>>,
    pump: Option<JoinHandle<()>>,
}

#[async_trait]
impl Connection for RusshConnection {
    async fn open_shell(&mut self, pty: PtySize) -> Result<RemoteStreams, SessionError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| SessionError::Io("connection already closed".to_string()))?;

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| SessionError::Io(format!("failed to create session: {e}")))?;

        let modes = [
            (Pty::ECHO, 0),
            (Pty::TTY_OP_ISPEED, TERMINAL_SPEED),
            (Pty::TTY_OP_OSPEED, TERMINAL_SPEED),
        ];
        channel
            .request_pty(false, "xterm", pty.cols, pty.rows, 0, 0, &modes)
            .await
            .map_err(|e| SessionError::Io(format!("request for pseudo terminal failed: {e}")))?;
        channel
            .request_shell(true)
            .await
            .map_err(|e| SessionError::Io(format!("failed to start shell: {e}")))?;

        let (stdout_tx, stdout_rx) = tokio::io::duplex(PIPE_CAPACITY);
        let (stderr_tx, stderr_rx) = tokio::io::duplex(PIPE_CAPACITY);
        let (stdin_tx, stdin_rx) = tokio::io::duplex(PIPE_CAPACITY);

        self.pump = Some(tokio::spawn(pump_channel(
            channel, stdout_tx, stderr_tx, stdin_rx,
        )));

        Ok(RemoteStreams {
            stdout: Box::new(stdout_rx),
            stderr: Box::new(stderr_rx),
            stdin: Box::new(stdin_tx),
        })
    }

    async fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle
                .disconnect(Disconnect::ByApplication, "", "en")
                .await
            {
                tracing::debug!("Disconnect failed: {}", e);
            }
        }
        // Dropping the pump closes the output pipes, which ends the readers
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

/// Move bytes between the SSH channel and the local pipes until either side
/// goes away
async fn pump_channel(
    mut channel: russh::Channel<client::Msg>,
    mut stdout: DuplexStream,
    mut stderr: DuplexStream,
    mut stdin: DuplexStream,
) {
    let mut input = [0u8; 1024];
    let mut stdin_open = true;
    loop {
        tokio::select! {
            msg = channel.wait() => {
                let Some(msg) = msg else { break };
                match msg {
                    ChannelMsg::Data { ref data } => {
                        if stdout.write_all(data).await.is_err() {
                            break;
                        }
                    }
                    ChannelMsg::ExtendedData { ref data, ext } => {
                        if ext == EXTENDED_DATA_STDERR && stderr.write_all(data).await.is_err() {
                            break;
                        }
                    }
                    ChannelMsg::Eof | ChannelMsg::Close => break,
                    ChannelMsg::ExitStatus { exit_status } => {
                        tracing::debug!("Remote shell exited with {}", exit_status);
                    }
                    _ => {}
                }
            }
            read = stdin.read(&mut input), if stdin_open => {
                match read {
                    Ok(0) | Err(_) => {
                        stdin_open = false;
                        let _ = channel.eof().await;
                    }
                    Ok(n) => {
                        if let Err(e) = channel.data(&input[..n]).await {
                            tracing::debug!("Channel write failed: {}", e);
                            break;
                        }
                    }
                }
            }
        }
    }
    let _ = stdout.shutdown().await;
    let _ = stderr.shutdown().await;
}
