//! Log-line highlighting
//!
//! Level keywords and ISO-8601 timestamps are painted with fixed colours.
//! Highlighting is applied to the visible lines at draw time, so toggling
//! it never touches the stored scrollback.

use once_cell::sync::Lazy;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

struct Rule {
    pattern: Regex,
    style: Style,
}

fn rule(pattern: &str, style: Style) -> Option<Rule> {
    match Regex::new(pattern) {
        Ok(pattern) => Some(Rule { pattern, style }),
        Err(e) => {
            tracing::error!("Invalid highlight pattern {}: {}", pattern, e);
            None
        }
    }
}

/// Earlier rules win when matches overlap
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    let fg = |r, g, b| Style::default().fg(Color::Rgb(r, g, b));
    [
        rule(
            r"(?i)\[?\bFATAL\b\]?",
            fg(0xff, 0x00, 0x00).add_modifier(Modifier::BOLD),
        ),
        rule(r"(?i)\[?\bERROR\b\]?", fg(0xff, 0x55, 0x55)),
        rule(r"(?i)\[?\bWARN(?:ING)?\b\]?", fg(0xff, 0xff, 0x00)),
        rule(r"(?i)\[?\bINFO\b\]?", fg(0x00, 0xaf, 0xff)),
        rule(r"(?i)\[?\bDEBUG\b\]?", fg(0x8b, 0xe9, 0xfd)),
        rule(r"(?i)\[?\bTRACE\b\]?", fg(0xbd, 0x93, 0xf9)),
        rule(
            r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:Z|[+-]\d{2}:\d{2})",
            fg(0x50, 0xfa, 0x7b),
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
});

/// Split `line` into spans, highlighting keywords and timestamps
pub fn colorize_line(line: &str, base: Style) -> Line<'static> {
    let mut marks: Vec<(usize, usize, Style)> = Vec::new();
    for rule in RULES.iter() {
        for m in rule.pattern.find_iter(line) {
            let overlaps = marks
                .iter()
                .any(|&(start, end, _)| m.start() < end && start < m.end());
            if !overlaps {
                marks.push((m.start(), m.end(), base.patch(rule.style)));
            }
        }
    }
    marks.sort_by_key(|&(start, _, _)| start);

    let mut spans = Vec::with_capacity(marks.len() * 2 + 1);
    let mut pos = 0;
    for (start, end, style) in marks {
        if start > pos {
            spans.push(Span::styled(line[pos..start].to_string(), base));
        }
        spans.push(Span::styled(line[start..end].to_string(), style));
        pos = end;
    }
    if pos < line.len() || spans.is_empty() {
        spans.push(Span::styled(line[pos..].to_string(), base));
    }
    Line::from(spans)
}

pub fn plain_line(line: &str, base: Style) -> Line<'static> {
    Line::from(Span::styled(line.to_string(), base))
}
