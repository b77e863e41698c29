//! Low-level text helpers shared by the reader tasks and the view layer

pub mod ansi;
pub mod display_width;
