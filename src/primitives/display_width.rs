//! Terminal column widths for tab labels, indicators and wrapped lines

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns taken by one character; control characters take none
#[inline]
pub fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Columns taken by a string
#[inline]
pub fn str_width(s: &str) -> usize {
    s.width()
}

/// Cut `s` so it fits in `max_width` columns, never splitting a wide character
pub fn truncate_to_width(s: &str, max_width: usize) -> &str {
    let mut used = 0;
    for (idx, ch) in s.char_indices() {
        let w = char_width(ch);
        if used + w > max_width {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// Left-pad `s` with spaces so it ends at column `width`
pub fn align_right(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(str_width(s));
    format!("{}{}", " ".repeat(pad), s)
}
