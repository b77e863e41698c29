//! Application state and the glue between session events and the UI
//!
//! The [`App`] lives on the UI thread. Session workers never touch it; they
//! post [`SessionEvent`]s which are drained once per loop iteration by
//! [`App::process_session_events`].

mod input;
mod render;
pub mod tab;

use std::sync::mpsc::{Receiver, TryRecvError};

use ratatui::layout::Rect;

use crate::config::ServerTarget;
use crate::keybindings::KeyMap;
use crate::services::session::SessionEvent;

pub use render::AppLayout;
pub use tab::{Tab, TabStatus};

/// Where the tab list is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabPlacement {
    /// One tab per row in a column left of the viewport
    Left,
    /// A single bar above the viewport
    Top,
}

impl TabPlacement {
    pub fn toggled(self) -> Self {
        match self {
            TabPlacement::Left => TabPlacement::Top,
            TabPlacement::Top => TabPlacement::Left,
        }
    }
}

pub struct App {
    tabs: Vec<Tab>,
    active: usize,
    keymap: KeyMap,
    events: Receiver<SessionEvent>,

    colorize: bool,
    word_wrap: bool,
    placement: TabPlacement,
    show_full_help: bool,
    should_quit: bool,

    /// Clickable tab areas from the last frame
    tab_areas: Vec<Rect>,
    viewport_area: Rect,
}

impl App {
    /// One tab per target, in configuration order
    pub fn new(
        targets: &[ServerTarget],
        keymap: KeyMap,
        max_lines: usize,
        events: Receiver<SessionEvent>,
    ) -> Self {
        Self {
            tabs: targets
                .iter()
                .map(|target| Tab::new(target.clone(), max_lines))
                .collect(),
            active: 0,
            keymap,
            events,
            colorize: false,
            word_wrap: false,
            placement: TabPlacement::Left,
            show_full_help: false,
            should_quit: false,
            tab_areas: Vec::new(),
            viewport_area: Rect::default(),
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab(&self, index: usize) -> Option<&Tab> {
        self.tabs.get(index)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    fn active_tab_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(self.active)
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn colorize(&self) -> bool {
        self.colorize
    }

    pub fn word_wrap(&self) -> bool {
        self.word_wrap
    }

    pub fn placement(&self) -> TabPlacement {
        self.placement
    }

    pub fn show_full_help(&self) -> bool {
        self.show_full_help
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Drain pending session events. Returns true if anything changed.
    pub fn process_session_events(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.handle_session_event(event);
                    changed = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    pub fn handle_session_event(&mut self, event: SessionEvent) {
        let index = event.index();
        let Some(tab) = self.tabs.get_mut(index) else {
            tracing::warn!("Event for unknown session {}", index);
            return;
        };

        match event {
            SessionEvent::Connected { handle, .. } => {
                tracing::info!("Connected to {}", tab.target().address());
                tab.on_connected(handle);
                if self.should_quit {
                    tab.close();
                }
            }
            SessionEvent::ConnectFailed { error, .. } => {
                tracing::warn!("Connection to {} failed: {}", tab.name(), error);
                tab.on_connect_failed(&error);
            }
            SessionEvent::Output { text, .. } => tab.on_output(&text),
            SessionEvent::StreamError { error, .. } => {
                tracing::warn!("Stream error on {}: {}", tab.name(), error);
                tab.on_stream_error(&error);
            }
            SessionEvent::CommandFailed { error, .. } => {
                tracing::error!("Command failed on {}: {}", tab.name(), error);
                tab.on_command_failed(&error);
            }
        }
    }

    /// Make `index` the active tab, dropping any scroll lock on it
    pub fn select_tab(&mut self, index: usize) {
        if index >= self.tabs.len() {
            return;
        }
        self.active = index;
        if let Some(tab) = self.active_tab_mut() {
            if !tab.has_error() {
                tab.view_mut().goto_bottom();
            }
        }
    }

    pub fn next_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.select_tab((self.active + 1) % self.tabs.len());
        }
    }

    pub fn prev_tab(&mut self) {
        if !self.tabs.is_empty() {
            let len = self.tabs.len();
            self.select_tab((self.active + len - 1) % len);
        }
    }

    /// Close every session and stop the loop
    pub fn quit(&mut self) {
        for tab in &mut self.tabs {
            tab.close();
        }
        self.should_quit = true;
    }
}
