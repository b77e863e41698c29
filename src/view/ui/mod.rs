//! Widgets drawn around the scrollback viewport

pub mod help;
pub mod tabs;
