//! Fixed colour palette
//!
//! Styles are small immutable records. Widgets get a [`PanelStyle`] and
//! text and build ratatui styles from it; nothing here is mutated after
//! construction.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelStyle {
    pub border: Color,
    pub foreground: Color,
    pub background: Color,
}

impl PanelStyle {
    pub const fn new(border: Color, foreground: Color, background: Color) -> Self {
        Self {
            border,
            foreground,
            background,
        }
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

pub const BRAND_BLUE: Color = rgb(0x0a7bca);
pub const AMBER: Color = rgb(0xffb000);
pub const ORANGE: Color = rgb(0xff8800);

pub const ACTIVE_TAB: PanelStyle = PanelStyle::new(BRAND_BLUE, Color::White, BRAND_BLUE);
pub const INACTIVE_TAB: PanelStyle = PanelStyle::new(rgb(0x444444), Color::White, rgb(0x444444));
pub const TAB_GAP: PanelStyle = PanelStyle::new(rgb(0x333333), Color::White, rgb(0x333333));

pub const VIEWPORT_NORMAL: PanelStyle = PanelStyle::new(BRAND_BLUE, Color::Reset, Color::Reset);
pub const VIEWPORT_SCROLLABLE: PanelStyle = PanelStyle::new(AMBER, Color::Reset, Color::Reset);
pub const VIEWPORT_LOCKED: PanelStyle = PanelStyle::new(ORANGE, Color::Reset, Color::Reset);

pub const ERROR_TEXT: PanelStyle = PanelStyle::new(rgb(0xff0000), rgb(0xff0000), Color::Reset);
pub const HELP_TEXT: PanelStyle = PanelStyle::new(rgb(0x888888), rgb(0x888888), Color::Reset);
pub const HELP_KEY: PanelStyle = PanelStyle::new(Color::Reset, rgb(0x87d7ff), Color::Reset);
pub const HELP_DESC: PanelStyle = PanelStyle::new(Color::Reset, rgb(0xa7b9c9), Color::Reset);
pub const HELP_SEPARATOR: PanelStyle = PanelStyle::new(Color::Reset, rgb(0x5f5f5f), Color::Reset);

/// Scroll state of a viewport, used to pick its border colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportState {
    Normal,
    Scrollable,
    Locked,
}

impl ViewportState {
    pub fn from_view(scrollable: bool, locked: bool) -> Self {
        match (scrollable, locked) {
            (_, true) => ViewportState::Locked,
            (true, false) => ViewportState::Scrollable,
            (false, false) => ViewportState::Normal,
        }
    }

    pub fn style(self) -> PanelStyle {
        match self {
            ViewportState::Normal => VIEWPORT_NORMAL,
            ViewportState::Scrollable => VIEWPORT_SCROLLABLE,
            ViewportState::Locked => VIEWPORT_LOCKED,
        }
    }
}

pub fn styled<'a>(text: impl Into<std::borrow::Cow<'a, str>>, style: &PanelStyle) -> Span<'a> {
    Span::styled(text, style.text())
}

/// Tab labels are bold when active and padded by two columns each side
pub fn tab_label(name: &str, active: bool) -> Span<'static> {
    let style = if active { ACTIVE_TAB } else { INACTIVE_TAB };
    let mut text = style.text();
    if active {
        text = text.add_modifier(Modifier::BOLD);
    }
    Span::styled(format!("  {}  ", name), text)
}

/// Rounded bordered block in the given style
pub fn panel_block(style: &PanelStyle) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(style.border_style())
}
