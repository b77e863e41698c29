//! Sanitising of raw PTY output
//!
//! Remote shells run under a pseudo-terminal and emit escape sequences
//! (colours, cursor movement, screen clears), carriage returns and other
//! control bytes. The scrollback only stores plain text, so the reader
//! tasks pass every chunk through an [`OutputSanitizer`] first.
//!
//! Reads are fixed-size, so an escape sequence or a multi-byte UTF-8
//! character can straddle two chunks. The sanitizer keeps that state
//! between calls.

/// Where the escape-sequence state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EscapeState {
    #[default]
    Ground,
    /// Saw ESC, waiting for the introducer
    Escape,
    /// Inside `ESC [ ...`, ends with a byte in 0x40..=0x7E
    Csi,
    /// Inside `ESC ] ...`, ends with BEL or `ESC \`
    Osc,
    /// Saw ESC inside an OSC string
    OscEscape,
    /// Inside `ESC ( B` and friends: intermediates 0x20..=0x2F, then a final byte
    EscapeIntermediate,
}

/// Tabs are expanded to this many spaces
const TAB_WIDTH: usize = 4;

/// Stateful converter from PTY bytes to displayable text
#[derive(Debug, Default)]
pub struct OutputSanitizer {
    state: EscapeState,
    /// Trailing bytes of an incomplete UTF-8 sequence from the previous chunk
    pending: Vec<u8>,
}

impl OutputSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one chunk of raw bytes into plain text.
    ///
    /// May return an empty string when the chunk only contained control data.
    pub fn feed(&mut self, bytes: &[u8]) -> String {
        let decoded = self.decode(bytes);
        let mut out = String::with_capacity(decoded.len());
        for ch in decoded.chars() {
            self.push_char(ch, &mut out);
        }
        out
    }

    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    out.push_str(text);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending[start..valid_end]) {
                        out.push_str(text);
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        // Incomplete sequence at the end: keep it for the next chunk
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
        out
    }

    fn push_char(&mut self, ch: char, out: &mut String) {
        self.state = match self.state {
            EscapeState::Ground => match ch {
                '\x1b' => EscapeState::Escape,
                '\n' => {
                    out.push('\n');
                    EscapeState::Ground
                }
                '\t' => {
                    out.extend(std::iter::repeat(' ').take(TAB_WIDTH));
                    EscapeState::Ground
                }
                c if c.is_control() => EscapeState::Ground,
                c => {
                    out.push(c);
                    EscapeState::Ground
                }
            },
            EscapeState::Escape => match ch {
                '[' => EscapeState::Csi,
                ']' => EscapeState::Osc,
                '\x20'..='\x2f' => EscapeState::EscapeIntermediate,
                _ => EscapeState::Ground,
            },
            EscapeState::EscapeIntermediate => match ch {
                '\x20'..='\x2f' => EscapeState::EscapeIntermediate,
                _ => EscapeState::Ground,
            },
            EscapeState::Csi => {
                if ('\x40'..='\x7e').contains(&ch) {
                    EscapeState::Ground
                } else {
                    EscapeState::Csi
                }
            }
            EscapeState::Osc => match ch {
                '\x07' => EscapeState::Ground,
                '\x1b' => EscapeState::OscEscape,
                _ => EscapeState::Osc,
            },
            EscapeState::OscEscape => match ch {
                '\\' => EscapeState::Ground,
                _ => EscapeState::Osc,
            },
        };
    }
}

/// Strip escape sequences and control characters from a complete string
pub fn strip_ansi_codes(text: &str) -> String {
    if !text.chars().any(|c| c.is_control() && c != '\n') {
        return text.to_string();
    }
    OutputSanitizer::new().feed(text.as_bytes())
}
