//! Windowed presentation of a [`ScrollBuffer`]
//!
//! The view renders the buffer into a cached list of display lines
//! (optionally word-wrapped) and shows a `height`-row window of it.
//!
//! Scroll-lock: while the user has scrolled away from the bottom, new
//! output does not move the window. Any upward action engages the lock.
//! Downward actions clear it once the window reaches the bottom again, and
//! explicit resets (End, reset-scroll, tab switch, clear) always clear it.

use crate::model::scroll_buffer::ScrollBuffer;
use crate::primitives::display_width::align_right;
use crate::view::wrap::wrap_text;

/// Columns reserved for the border and padding when wrapping
pub const WRAP_MARGIN: usize = 4;
/// Effective widths at or below this disable wrapping
pub const MIN_WRAP_WIDTH: usize = 10;

/// Which sides of the window have hidden content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Above,
    Below,
    Both,
}

impl Overflow {
    pub fn symbol(self) -> &'static str {
        match self {
            Overflow::Above => "↑",
            Overflow::Below => "↓",
            Overflow::Both => "↑↓",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrollView {
    buffer: ScrollBuffer,
    width: usize,
    height: usize,
    word_wrap: bool,
    scroll_locked: bool,
    /// Index of the first visible content line
    offset: usize,
    /// Buffer rendered at the current width and wrap mode
    content: Vec<String>,
    /// Set when the size changed since `content` was built
    stale: bool,
}

impl ScrollView {
    pub fn new(max_lines: usize) -> Self {
        Self {
            buffer: ScrollBuffer::new(max_lines),
            width: 80,
            height: 20,
            word_wrap: false,
            scroll_locked: false,
            offset: 0,
            content: Vec::new(),
            stale: false,
        }
    }

    pub fn buffer(&self) -> &ScrollBuffer {
        &self.buffer
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn word_wrap(&self) -> bool {
        self.word_wrap
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Append output and follow the bottom unless scroll-locked
    pub fn append(&mut self, content: &str) {
        self.buffer.append(content);
        self.refresh();
    }

    /// Empty the buffer and drop the scroll-lock
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scroll_locked = false;
        self.offset = 0;
        self.refresh();
    }

    /// Record the new viewport size. Content is re-rendered lazily.
    pub fn set_size(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.stale = true;
        }
    }

    pub fn toggle_word_wrap(&mut self) {
        self.word_wrap = !self.word_wrap;
        self.refresh();
    }

    pub fn set_word_wrap(&mut self, enabled: bool) {
        if self.word_wrap != enabled {
            self.toggle_word_wrap();
        }
    }

    /// Wrap `content` for a viewport of `width` columns.
    ///
    /// The margin is subtracted first; effective widths of
    /// [`MIN_WRAP_WIDTH`] or less return the content unchanged.
    pub fn wrap(content: &str, width: usize) -> String {
        let effective = width.saturating_sub(WRAP_MARGIN);
        if effective <= MIN_WRAP_WIDTH {
            return content.to_string();
        }
        wrap_text(content, effective)
    }

    /// More content lines than viewport rows, as of the last render
    pub fn is_scrollable(&self) -> bool {
        self.content.len() > self.height
    }

    pub fn content_lines(&self) -> usize {
        self.content.len()
    }

    fn max_offset(&self) -> usize {
        self.content.len().saturating_sub(self.height)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.offset >= self.max_offset()
    }

    pub fn set_user_scrolled(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    /// Clear the scroll-lock if the window sits at the bottom
    pub fn reset_if_at_bottom(&mut self) {
        if self.is_at_bottom() {
            self.scroll_locked = false;
        }
    }

    /// Make the lock match the window position: locked unless at the bottom.
    /// Returns true if the lock changed.
    pub fn sync_scroll_lock(&mut self) -> bool {
        self.ensure_fresh();
        let locked = !self.is_at_bottom();
        let changed = locked != self.scroll_locked;
        self.set_user_scrolled(locked);
        changed
    }

    pub fn line_up(&mut self, n: usize) {
        self.ensure_fresh();
        self.offset = self.offset.saturating_sub(n);
        self.set_user_scrolled(true);
    }

    pub fn line_down(&mut self, n: usize) {
        self.ensure_fresh();
        self.offset = (self.offset + n).min(self.max_offset());
        self.reset_if_at_bottom();
    }

    pub fn page_up(&mut self) {
        self.line_up(self.height.max(1));
    }

    pub fn page_down(&mut self) {
        self.line_down(self.height.max(1));
    }

    pub fn goto_top(&mut self) {
        self.ensure_fresh();
        self.offset = 0;
        self.set_user_scrolled(true);
    }

    /// Jump to the bottom and resume following new output
    pub fn goto_bottom(&mut self) {
        self.ensure_fresh();
        self.offset = self.max_offset();
        self.scroll_locked = false;
    }

    /// Hidden content relative to the window, if any
    pub fn overflow(&self) -> Option<Overflow> {
        if !self.is_scrollable() {
            return None;
        }
        let above = self.offset > 0;
        let below = self.offset < self.max_offset();
        match (above, below) {
            (true, true) => Some(Overflow::Both),
            (true, false) => Some(Overflow::Above),
            (false, true) => Some(Overflow::Below),
            (false, false) => None,
        }
    }

    /// Lines inside the window
    pub fn visible_lines(&mut self) -> &[String] {
        self.ensure_fresh();
        let end = (self.offset + self.height).min(self.content.len());
        &self.content[self.offset.min(end)..end]
    }

    /// The window as text, followed by a right-aligned overflow indicator
    /// line when content is hidden above or below
    pub fn render(&mut self) -> String {
        let mut out = self.visible_lines().join("\n");
        if let Some(overflow) = self.overflow() {
            out.push('\n');
            out.push_str(&align_right(overflow.symbol(), self.width));
        }
        out
    }

    fn ensure_fresh(&mut self) {
        if self.stale {
            self.refresh();
        }
    }

    /// Rebuild `content` from the buffer and re-anchor the window
    fn refresh(&mut self) {
        self.content = if self.buffer.is_empty() {
            Vec::new()
        } else if self.word_wrap {
            Self::wrap(&self.buffer.render(), self.width)
                .split('\n')
                .map(str::to_string)
                .collect()
        } else {
            self.buffer.lines().map(str::to_string).collect()
        };
        self.stale = false;

        if self.scroll_locked {
            self.offset = self.offset.min(self.max_offset());
        } else {
            self.offset = self.max_offset();
        }
    }
}
