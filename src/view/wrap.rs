//! Greedy word wrapping for scrollback text
//!
//! Each physical line is broken independently. A line that fits is kept as
//! is; otherwise it is cut at the last space inside the next `width` columns,
//! or hard-cut at `width` when that window has no space. The space a line is
//! broken at is consumed.

use crate::primitives::display_width::char_width;

/// Break one line (no `\n`) into segments of at most `width` columns.
///
/// A segment is only wider than `width` when a single character is wider
/// than the whole budget. `width == 0` returns the line unchanged.
pub fn wrap_line(line: &str, width: usize) -> Vec<&str> {
    if width == 0 {
        return vec![line];
    }

    let mut segments = Vec::new();
    let mut rest = line;
    loop {
        let Some(fit_end) = overflow_at(rest, width) else {
            segments.push(rest);
            break;
        };

        let window = &rest[..fit_end];
        match window.rfind(' ') {
            Some(space) => {
                segments.push(&rest[..space]);
                rest = &rest[space + 1..];
            }
            _ => {
                segments.push(window);
                rest = &rest[fit_end..];
            }
        }
    }
    segments
}

/// Byte offset of the first character that does not fit in `width`
/// columns, or `None` when the whole string fits. Always leaves at least one
/// character before the cut.
fn overflow_at(s: &str, width: usize) -> Option<usize> {
    let mut used = 0;
    for (idx, ch) in s.char_indices() {
        let w = char_width(ch);
        if used + w > width && idx > 0 {
            return Some(idx);
        }
        used += w;
    }
    None
}

/// Wrap every line of `content` to `width` columns and join the result
pub fn wrap_text(content: &str, width: usize) -> String {
    let mut out = String::with_capacity(content.len() + content.len() / 8);
    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for (j, segment) in wrap_line(line, width).into_iter().enumerate() {
            if j > 0 {
                out.push('\n');
            }
            out.push_str(segment);
        }
    }
    out
}
