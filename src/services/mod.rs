pub mod log_dirs;
pub mod session;
pub mod terminal_modes;
pub mod tracing_setup;
