//! Tab list, either as a left-hand column or a top bar

use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::primitives::display_width::{str_width, truncate_to_width};
use crate::view::theme::{tab_label, TAB_GAP};

/// Padding added around each label
const LABEL_PADDING: usize = 4;

/// Width of the vertical tab column: the widest label plus padding
pub fn tab_column_width<S: AsRef<str>>(names: &[S]) -> u16 {
    let widest = names
        .iter()
        .map(|name| str_width(name.as_ref()) + LABEL_PADDING)
        .max()
        .unwrap_or(0);
    u16::try_from(widest).unwrap_or(u16::MAX)
}

/// One row per tab, top to bottom, clipped to `area`
pub fn vertical_tab_areas(area: Rect, count: usize) -> Vec<Rect> {
    (0..count.min(area.height as usize))
        .map(|i| Rect::new(area.x, area.y + i as u16, area.width, 1))
        .collect()
}

/// Tabs laid out left to right on the first row of `area`, clipped to its
/// width
pub fn horizontal_tab_areas<S: AsRef<str>>(area: Rect, names: &[S]) -> Vec<Rect> {
    let right = area.x.saturating_add(area.width);
    let mut x = area.x;
    let mut areas = Vec::with_capacity(names.len());
    for name in names {
        if x >= right {
            break;
        }
        let width = (str_width(name.as_ref()) + LABEL_PADDING) as u16;
        let width = width.min(right - x);
        areas.push(Rect::new(x, area.y, width, 1));
        x = x.saturating_add(width);
    }
    areas
}

fn draw_labels<S: AsRef<str>>(frame: &mut Frame, areas: &[Rect], names: &[S], active: usize) {
    for (i, (rect, name)) in areas.iter().zip(names).enumerate() {
        let room = (rect.width as usize).saturating_sub(LABEL_PADDING);
        let label = tab_label(truncate_to_width(name.as_ref(), room), i == active);
        frame.render_widget(Paragraph::new(Line::from(label)), *rect);
    }
}

/// Draw a vertical tab column and return each tab's clickable area
pub fn render_vertical<S: AsRef<str>>(
    frame: &mut Frame,
    area: Rect,
    names: &[S],
    active: usize,
) -> Vec<Rect> {
    let areas = vertical_tab_areas(area, names.len());
    draw_labels(frame, &areas, names, active);
    areas
}

/// Draw a horizontal tab bar and return each tab's clickable area
pub fn render_horizontal<S: AsRef<str>>(
    frame: &mut Frame,
    area: Rect,
    names: &[S],
    active: usize,
) -> Vec<Rect> {
    let bar = Rect::new(area.x, area.y, area.width, area.height.min(1));
    frame.render_widget(Block::default().style(TAB_GAP.text()), bar);
    let areas = horizontal_tab_areas(bar, names);
    draw_labels(frame, &areas, names, active);
    areas
}
