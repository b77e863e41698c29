use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no path is given
pub const DEFAULT_SERVERS_FILE: &str = "servers.toml";
/// Fallback name accepted when `servers.toml` does not exist
pub const FALLBACK_SERVERS_FILE: &str = "config.toml";

/// Top-level server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub servers: Vec<ServerTarget>,

    #[serde(default)]
    pub session: SessionSettings,
}

/// One remote host and the commands to run on it. Immutable after load.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerTarget {
    pub name: String,
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default)]
    pub commands: Vec<String>,
}

impl std::fmt::Debug for ServerTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerTarget")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("private_key_path", &self.private_key_path)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("commands", &self.commands)
            .finish()
    }
}

/// How a session authenticates
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    PrivateKey(PathBuf),
    Password(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::PrivateKey(path) => f.debug_tuple("PrivateKey").field(path).finish(),
            Credential::Password(_) => f.write_str("Password(<redacted>)"),
        }
    }
}

impl ServerTarget {
    /// Pick the authentication method: a private key wins over a password.
    /// Empty values count as unset.
    pub fn credential(&self) -> Option<Credential> {
        if let Some(path) = self
            .private_key_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
        {
            return Some(Credential::PrivateKey(path.clone()));
        }
        self.password
            .as_ref()
            .filter(|p| !p.is_empty())
            .map(|p| Credential::Password(p.clone()))
    }

    /// `host:port` as dialled
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_port() -> u16 {
    22
}

/// Which streamed output reaches the tab after a command batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputVisibility {
    /// Every chunk read from the session is shown
    #[default]
    All,
    /// Output is dropped until the last command of a batch has been sent
    LastCommand,
}

/// Timing and capacity knobs shared by every session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Pause after the shell starts, before the first write
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// Send `clear` once the shell is up to drop login banners
    #[serde(default = "default_true")]
    pub clear_on_start: bool,

    /// Pause after the startup `clear`
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Pause between consecutive commands of a batch
    #[serde(default = "default_command_delay_ms")]
    pub command_delay_ms: u64,

    /// Scrollback capacity per tab
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    #[serde(default)]
    pub output_visibility: OutputVisibility,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_startup_delay_ms() -> u64 {
    500
}

fn default_settle_delay_ms() -> u64 {
    300
}

fn default_command_delay_ms() -> u64 {
    500
}

fn default_max_lines() -> usize {
    crate::model::scroll_buffer::DEFAULT_MAX_LINES
}

fn default_true() -> bool {
    true
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            startup_delay_ms: default_startup_delay_ms(),
            clear_on_start: true,
            settle_delay_ms: default_settle_delay_ms(),
            command_delay_ms: default_command_delay_ms(),
            max_lines: default_max_lines(),
            output_visibility: OutputVisibility::default(),
        }
    }
}

impl SessionSettings {
    /// Settings with every delay removed (tests, scripted transports)
    pub fn immediate() -> Self {
        Self {
            startup_delay_ms: 0,
            settle_delay_ms: 0,
            command_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }
}

impl Config {
    /// Resolve which server file to read.
    ///
    /// An explicit path always wins. Otherwise `servers.toml` in the working
    /// directory, falling back to `config.toml` when only that one exists.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        let primary = PathBuf::from(DEFAULT_SERVERS_FILE);
        if !primary.exists() {
            let fallback = PathBuf::from(FALLBACK_SERVERS_FILE);
            if fallback.exists() {
                return fallback;
            }
        }
        primary
    }

    /// Load and validate the server file
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = Self::resolve_path(explicit);
        Self::load_from_file(&path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::IoError(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::ParseError(msg) => {
                ConfigError::ParseError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        tracing::info!(
            "Loaded {} server(s) from {}",
            config.servers.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse, normalise and validate a server file's contents
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let home = dirs::home_dir();
        for server in &mut config.servers {
            if server.port == 0 {
                server.port = default_port();
            }
            if let Some(path) = server.private_key_path.take() {
                server.private_key_path = Some(expand_home(&path, home.as_deref()));
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError::ValidationError(
                "no servers configured".to_string(),
            ));
        }
        for (i, server) in self.servers.iter().enumerate() {
            if server.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "server #{} has an empty name",
                    i + 1
                )));
            }
            if server.host.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "server '{}' has an empty host",
                    server.name
                )));
            }
        }
        Ok(())
    }
}

/// Replace a leading `~/` with the home directory
fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
