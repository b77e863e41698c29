//! Tracing subscriber setup
//!
//! The terminal belongs to the UI, so diagnostics only ever go to a file.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber writing to `log_file_path`.
///
/// Returns false when the file cannot be created; the program then runs
/// without logging.
pub fn init_global(log_file_path: &Path) -> bool {
    let Ok(log_file) = File::create(log_file_path) else {
        return false;
    };
    build_subscriber(log_file).try_init().is_ok()
}

/// File logger filtered by `RUST_LOG`, DEBUG by default.
///
/// russh logs every packet at debug level, so it is capped at info.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let mut env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into());
    for directive in ["russh=info", "russh_keys=info"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
