//! Per-target UI state

use crate::config::ServerTarget;
use crate::services::session::{SessionError, SessionHandle};
use crate::view::scroll_view::ScrollView;

/// Connection progress as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Connecting,
    Connected,
    /// Connecting failed; the tab only shows the error from now on
    Failed,
    /// The session ended after connecting
    Closed,
}

/// One tab: a target, its scrollback view and its session handle
pub struct Tab {
    target: ServerTarget,
    view: ScrollView,
    handle: Option<SessionHandle>,
    status: TabStatus,
    error: Option<String>,
}

impl Tab {
    pub fn new(target: ServerTarget, max_lines: usize) -> Self {
        let mut view = ScrollView::new(max_lines);
        view.append("Connecting...\n");
        Self {
            target,
            view,
            handle: None,
            status: TabStatus::Connecting,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.target.name
    }

    pub fn target(&self) -> &ServerTarget {
        &self.target
    }

    pub fn status(&self) -> TabStatus {
        self.status
    }

    pub fn view(&self) -> &ScrollView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ScrollView {
        &mut self.view
    }

    /// Message shown instead of the scrollback once connecting failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The worker is up: replace the placeholder and start the command batch
    pub fn on_connected(&mut self, handle: SessionHandle) {
        self.view.clear();
        self.view.append(&format!("Connected to {}\n", self.target.host));
        self.status = TabStatus::Connected;

        if !self.target.commands.is_empty()
            && !handle.run_commands(self.target.commands.clone())
        {
            tracing::warn!("Session for {} exited before commands were sent", self.target.name);
        }
        self.handle = Some(handle);
    }

    pub fn on_connect_failed(&mut self, error: &SessionError) {
        let message = format!("Connection failed: {}", error);
        self.view.clear();
        self.view.append(&message);
        self.error = Some(message);
        self.status = TabStatus::Failed;
    }

    pub fn on_output(&mut self, text: &str) {
        if !self.has_error() {
            self.view.append(text);
        }
    }

    /// Report an error inline without leaving the scrollback
    pub fn on_stream_error(&mut self, error: &SessionError) {
        if self.has_error() {
            return;
        }
        if self.view.buffer().has_open_line() {
            self.view.append("\n");
        }
        self.view.append(&format!("Error: {}\n", error));
    }

    /// A command could not be written; the worker has shut the session down
    pub fn on_command_failed(&mut self, error: &SessionError) {
        self.on_stream_error(error);
        self.handle = None;
        self.status = TabStatus::Closed;
    }

    /// Ask the worker to close, if there is one
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
    }
}
