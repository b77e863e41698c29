//! Frame layout and drawing

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use super::{App, TabPlacement};
use crate::view::colorize::{colorize_line, plain_line};
use crate::view::theme::{panel_block, ViewportState, ERROR_TEXT, VIEWPORT_NORMAL};
use crate::view::ui::{help, tabs};

/// Screen regions for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub tabs: Rect,
    pub viewport: Rect,
    pub help: Rect,
}

impl App {
    fn tab_names(&self) -> Vec<&str> {
        self.tabs.iter().map(|tab| tab.name()).collect()
    }

    fn help_height(&self) -> u16 {
        if self.show_full_help {
            help::full_help_height(&self.keymap)
        } else {
            1
        }
    }

    /// Split `area` into tab list, viewport and help rows
    pub fn layout(&self, area: Rect) -> AppLayout {
        let [body, help_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(self.help_height())])
                .areas(area);

        match self.placement {
            TabPlacement::Left => {
                let width = tabs::tab_column_width(&self.tab_names());
                let [tab_area, viewport] =
                    Layout::horizontal([Constraint::Length(width), Constraint::Min(0)])
                        .areas(body);
                AppLayout {
                    tabs: tab_area,
                    viewport,
                    help: help_area,
                }
            }
            TabPlacement::Top => {
                let [tab_area, viewport] =
                    Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(body);
                AppLayout {
                    tabs: tab_area,
                    viewport,
                    help: help_area,
                }
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let layout = self.layout(frame.area());

        let names: Vec<String> = self.tabs.iter().map(|t| t.name().to_string()).collect();
        self.tab_areas = match self.placement {
            TabPlacement::Left => tabs::render_vertical(frame, layout.tabs, &names, self.active),
            TabPlacement::Top => tabs::render_horizontal(frame, layout.tabs, &names, self.active),
        };

        self.viewport_area = layout.viewport;
        self.render_viewport(frame, layout.viewport);
        self.render_help(frame, layout.help);
    }

    fn render_viewport(&mut self, frame: &mut Frame, area: Rect) {
        let colorize = self.colorize;
        let Some(tab) = self.tabs.get_mut(self.active) else {
            frame.render_widget(panel_block(&VIEWPORT_NORMAL), area);
            return;
        };

        if let Some(message) = tab.error() {
            let paragraph = Paragraph::new(Line::styled(message.to_string(), ERROR_TEXT.text()))
                .wrap(Wrap { trim: false })
                .block(panel_block(&VIEWPORT_NORMAL));
            frame.render_widget(paragraph, area);
            return;
        }

        let inner_height = area.height.saturating_sub(2) as usize;
        let view = tab.view_mut();
        view.set_size(area.width as usize, inner_height);

        let lines: Vec<Line<'static>> = view
            .visible_lines()
            .iter()
            .map(|line| {
                if colorize {
                    colorize_line(line, Style::default())
                } else {
                    plain_line(line, Style::default())
                }
            })
            .collect();

        let state = ViewportState::from_view(view.is_scrollable(), view.scroll_locked());
        let style = state.style();
        let mut block = panel_block(&style);
        if let Some(overflow) = view.overflow() {
            block = block.title_bottom(
                Line::styled(overflow.symbol(), style.border_style()).right_aligned(),
            );
        }

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        if self.show_full_help {
            frame.render_widget(Paragraph::new(help::full_help(&self.keymap)), area);
            return;
        }

        let info = self.active_tab().and_then(|tab| {
            let buffer = tab.view().buffer();
            help::buffer_info(buffer.line_count(), buffer.max_lines())
        });

        // Buffer fill stays visible on the right even when the keys are cut off
        let info_width = info.as_ref().map_or(0, |span| span.width() as u16);
        let [keys_area, info_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(info_width)]).areas(area);

        frame.render_widget(Paragraph::new(help::short_help(&self.keymap)), keys_area);
        if let Some(info) = info {
            frame.render_widget(Paragraph::new(Line::from(info)), info_area);
        }
    }
}
