pub mod colorize;
pub mod scroll_view;
pub mod theme;
pub mod ui;
pub mod wrap;
