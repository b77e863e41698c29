//! Keyboard and mouse dispatch

use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use super::App;
use crate::keybindings::Action;

/// Lines moved per wheel notch
const WHEEL_LINES: usize = 3;

fn contains(rect: &Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

impl App {
    /// Handle a key press. Returns the action it triggered, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        let action = self.keymap.action_for(&key)?;
        tracing::trace!("Key {:?} -> {:?}", key.code, action);
        self.apply(action);
        Some(action)
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.quit(),
            Action::Left | Action::TabPrev => self.prev_tab(),
            Action::Right | Action::TabNext => self.next_tab(),
            Action::ToggleColor => self.colorize = !self.colorize,
            Action::ToggleHelp => self.show_full_help = !self.show_full_help,
            Action::ToggleTabPosition => self.placement = self.placement.toggled(),
            Action::ToggleWordWrap => self.toggle_word_wrap(),
            _ => self.apply_to_view(action),
        }
    }

    /// Word wrap is shared by every tab
    fn toggle_word_wrap(&mut self) {
        match self.active_tab() {
            Some(tab) if !tab.has_error() => {}
            _ => return,
        }
        self.word_wrap = !self.word_wrap;
        let enabled = self.word_wrap;
        for tab in self.tabs.iter_mut().filter(|tab| !tab.has_error()) {
            tab.view_mut().set_word_wrap(enabled);
        }
    }

    /// Scroll and buffer actions on the active tab; error tabs ignore them
    fn apply_to_view(&mut self, action: Action) {
        let Some(tab) = self.active_tab_mut() else {
            return;
        };
        if tab.has_error() {
            return;
        }
        let view = tab.view_mut();
        match action {
            Action::Up => view.line_up(1),
            Action::Down => view.line_down(1),
            Action::PageUp => view.page_up(),
            Action::PageDown => view.page_down(),
            Action::Home => view.goto_top(),
            Action::End | Action::ResetScroll => view.goto_bottom(),
            Action::ClearBuffer => view.clear(),
            _ => {}
        }
    }

    /// Handle a mouse event. Returns true if a re-render is needed.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let hit = self
                    .tab_areas
                    .iter()
                    .position(|rect| contains(rect, mouse.column, mouse.row));
                match hit {
                    Some(index) => {
                        self.select_tab(index);
                        true
                    }
                    None => false,
                }
            }
            MouseEventKind::ScrollUp => self.scroll_active(true),
            MouseEventKind::ScrollDown => self.scroll_active(false),
            MouseEventKind::Moved if contains(&self.viewport_area, mouse.column, mouse.row) => {
                match self.active_tab_mut() {
                    Some(tab) if !tab.has_error() => tab.view_mut().sync_scroll_lock(),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn scroll_active(&mut self, up: bool) -> bool {
        let Some(tab) = self.active_tab_mut() else {
            return false;
        };
        if tab.has_error() {
            return false;
        }
        if up {
            tab.view_mut().line_up(WHEEL_LINES);
        } else {
            tab.view_mut().line_down(WHEEL_LINES);
        }
        true
    }
}
