//! Bounded scrollback storage for one remote session
//!
//! Output arrives in arbitrary chunks, so a chunk may end in the middle of a
//! line. The buffer keeps track of whether its last line is still "open"
//! (not yet newline-terminated); the next append continues that line instead
//! of starting a new one.
//!
//! Capacity is enforced after every append by dropping the oldest lines.

use std::collections::VecDeque;

/// Default scrollback capacity in lines
pub const DEFAULT_MAX_LINES: usize = 1000;

/// Append-only ring of text lines with partial-line coalescing
#[derive(Debug, Clone)]
pub struct ScrollBuffer {
    lines: VecDeque<String>,
    max_lines: usize,
    /// True while the last stored line has not seen its terminating newline
    open: bool,
}

impl Default for ScrollBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

impl ScrollBuffer {
    /// Create an empty buffer. A capacity of zero selects [`DEFAULT_MAX_LINES`].
    pub fn new(max_lines: usize) -> Self {
        let max_lines = if max_lines == 0 {
            DEFAULT_MAX_LINES
        } else {
            max_lines
        };
        Self {
            lines: VecDeque::with_capacity(max_lines.min(4096)),
            max_lines,
            open: false,
        }
    }

    /// Append a chunk of output.
    ///
    /// The chunk is split on `\n`. If the last stored line is open, the first
    /// fragment extends it in place. A trailing newline terminates the last
    /// line without creating an empty one.
    pub fn append(&mut self, content: &str) {
        if content.is_empty() {
            return;
        }

        let mut fragments = content.split('\n');
        let first = fragments.next().unwrap_or_default();
        let rest: Vec<&str> = fragments.collect();

        match self.lines.back_mut() {
            Some(last) if self.open => last.push_str(first),
            _ => self.lines.push_back(first.to_string()),
        }

        match rest.split_last() {
            None => self.open = true,
            Some((tail, middle)) => {
                self.lines
                    .extend(middle.iter().map(|fragment| fragment.to_string()));
                if tail.is_empty() {
                    self.open = false;
                } else {
                    self.lines.push_back(tail.to_string());
                    self.open = true;
                }
            }
        }

        self.evict();
    }

    /// Drop everything, keeping the configured capacity
    pub fn clear(&mut self) {
        self.lines.clear();
        self.open = false;
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the last line is still waiting for its newline
    pub fn has_open_line(&self) -> bool {
        self.open && !self.lines.is_empty()
    }

    /// Iterate stored lines, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// All lines joined by `\n`, oldest first
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(line);
        }
        out
    }

    fn evict(&mut self) {
        let excess = self.lines.len().saturating_sub(self.max_lines);
        if excess > 0 {
            self.lines.drain(..excess);
        }
    }
}
