//! Key help shown under the viewport

use ratatui::text::{Line, Span};

use crate::keybindings::{Action, KeyMap};
use crate::primitives::display_width::str_width;
use crate::view::theme::{styled, HELP_DESC, HELP_KEY, HELP_SEPARATOR, HELP_TEXT};

const SHORT_SEPARATOR: &str = " • ";
const COLUMN_GAP: &str = "    ";

fn entry(keymap: &KeyMap, action: Action) -> (String, &'static str) {
    (keymap.help_label(action), action.description())
}

/// One-line help: `←/h previous tab • →/l next tab • ...`
pub fn short_help(keymap: &KeyMap) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, action) in keymap.short_help().iter().enumerate() {
        if i > 0 {
            spans.push(styled(SHORT_SEPARATOR, &HELP_SEPARATOR));
        }
        let (key, desc) = entry(keymap, *action);
        spans.push(styled(key, &HELP_KEY));
        spans.push(Span::raw(" "));
        spans.push(styled(desc, &HELP_DESC));
    }
    Line::from(spans)
}

/// Rows needed by [`full_help`]
pub fn full_help_height(keymap: &KeyMap) -> u16 {
    keymap
        .full_help()
        .iter()
        .map(|column| column.len())
        .max()
        .unwrap_or(0) as u16
}

/// Expanded help laid out in columns (tabs, scrolling, actions)
pub fn full_help(keymap: &KeyMap) -> Vec<Line<'static>> {
    let columns: Vec<Vec<(String, &'static str)>> = keymap
        .full_help()
        .iter()
        .map(|column| column.iter().map(|a| entry(keymap, *a)).collect())
        .collect();

    let key_widths: Vec<usize> = columns
        .iter()
        .map(|c| c.iter().map(|(k, _)| str_width(k)).max().unwrap_or(0))
        .collect();
    let desc_widths: Vec<usize> = columns
        .iter()
        .map(|c| c.iter().map(|(_, d)| str_width(d)).max().unwrap_or(0))
        .collect();

    let rows = full_help_height(keymap) as usize;
    (0..rows)
        .map(|row| {
            let mut spans = Vec::new();
            for (col, entries) in columns.iter().enumerate() {
                if col > 0 {
                    spans.push(Span::raw(COLUMN_GAP));
                }
                let (key, desc) = entries
                    .get(row)
                    .map(|(k, d)| (k.as_str(), *d))
                    .unwrap_or(("", ""));
                spans.push(styled(pad(key, key_widths[col]), &HELP_KEY));
                spans.push(Span::raw(" "));
                spans.push(styled(pad(desc, desc_widths[col]), &HELP_DESC));
            }
            Line::from(spans)
        })
        .collect()
}

fn pad(text: &str, width: usize) -> String {
    format!("{}{}", text, " ".repeat(width.saturating_sub(str_width(text))))
}

/// ` • n/max lines in buffer` once the buffer is at least half full
pub fn buffer_info(line_count: usize, max_lines: usize) -> Option<Span<'static>> {
    if max_lines == 0 || line_count < max_lines / 2 {
        return None;
    }
    Some(styled(
        format!("{}{}/{} lines in buffer", SHORT_SEPARATOR, line_count, max_lines),
        &HELP_TEXT,
    ))
}
