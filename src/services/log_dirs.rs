//! Log file locations
//!
//! Logs live under `$XDG_STATE_HOME/herd/logs/` (usually
//! `~/.local/state/herd/logs/`), one file per process named by PID so that
//! concurrent runs never share a file. Files older than a day are removed
//! at startup.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

const CLEANUP_AGE: Duration = Duration::from_secs(24 * 60 * 60);

const LOG_PREFIX: &str = "herd-";

static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Base log directory, created on first use
pub fn log_dir() -> &'static PathBuf {
    LOG_DIR.get_or_init(|| {
        let fallback = std::env::temp_dir().join("herd-logs");
        let dir = state_log_dir().unwrap_or_else(|| fallback.clone());

        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Failed to create log directory {:?}: {}", dir, e);
            return fallback;
        }
        dir
    })
}

fn state_log_dir() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
        .map(|state| state.join("herd").join("logs"))
}

/// `{log_dir}/herd-{PID}.log`
pub fn main_log_path() -> PathBuf {
    log_dir().join(format!("{}{}.log", LOG_PREFIX, std::process::id()))
}

/// Remove log files from earlier runs that are older than a day
pub fn cleanup_stale_logs() {
    cleanup_stale_logs_in_dir(log_dir(), std::process::id(), CLEANUP_AGE);
}

fn cleanup_stale_logs_in_dir(dir: &Path, current_pid: u32, max_age: Duration) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        let Some(pid) = extract_pid_from_filename(&name) else {
            continue;
        };
        if pid == current_pid {
            continue;
        }

        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && is_file_older_than(&entry.path(), max_age) {
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!("Removed stale log {:?}", entry.path());
                }
                Err(e) => tracing::debug!("Failed to remove stale log {:?}: {}", entry.path(), e),
            }
        }
    }
    removed
}

fn is_file_older_than(path: &Path, age: Duration) -> bool {
    let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|elapsed| elapsed > age)
        .unwrap_or(false)
}

/// PID from a name like `herd-12345.log`
fn extract_pid_from_filename(name: &str) -> Option<u32> {
    name.strip_prefix(LOG_PREFIX)?
        .strip_suffix(".log")?
        .parse()
        .ok()
}

/// Print the files and directories herd reads and writes
pub fn print_all_paths(servers: &Path, keybinds: Option<&Path>) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let keybinds = keybinds
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("<unavailable>"));

    writeln!(handle, "herd paths:").ok();
    writeln!(handle).ok();
    writeln!(handle, "Servers:   {}", servers.display()).ok();
    writeln!(handle, "Keybinds:  {}", keybinds.display()).ok();
    writeln!(handle, "Logs:      {}", log_dir().display()).ok();
    writeln!(handle, "  this run:  {}", main_log_path().display()).ok();
}
