//! Data owned by the UI thread

pub mod scroll_buffer;
