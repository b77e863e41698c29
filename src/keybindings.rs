//! Key bindings
//!
//! Actions form a closed set. Each has a static default entry naming its
//! config key, default keys and help text. A user file may override the key
//! list of any action; actions it leaves out or empty keep their defaults.
//!
//! File format (`keybinds.toml`):
//!
//! ```toml
//! [keybinds]
//! up = ["up", "k"]
//! quit = ["q", "ctrl+c"]
//! ```

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Quit,
    ToggleColor,
    ResetScroll,
    TabNext,
    TabPrev,
    ClearBuffer,
    ToggleWordWrap,
    ToggleTabPosition,
    ToggleHelp,
}

struct ActionEntry {
    action: Action,
    name: &'static str,
    keys: &'static [&'static str],
    description: &'static str,
}

#[rustfmt::skip]
const DEFAULT_BINDINGS: &[ActionEntry] = &[
    ActionEntry { action: Action::Up, name: "up", keys: &["up", "k"], description: "scroll up" },
    ActionEntry { action: Action::Down, name: "down", keys: &["down", "j"], description: "scroll down" },
    ActionEntry { action: Action::Left, name: "left", keys: &["left", "h"], description: "previous tab" },
    ActionEntry { action: Action::Right, name: "right", keys: &["right", "l"], description: "next tab" },
    ActionEntry { action: Action::PageUp, name: "pageUp", keys: &["pgup"], description: "page up" },
    ActionEntry { action: Action::PageDown, name: "pageDown", keys: &["pgdown"], description: "page down" },
    ActionEntry { action: Action::Home, name: "home", keys: &["home"], description: "scroll to top" },
    ActionEntry { action: Action::End, name: "end", keys: &["end", "G"], description: "scroll to bottom" },
    ActionEntry { action: Action::Quit, name: "quit", keys: &["q", "ctrl+c"], description: "quit" },
    ActionEntry { action: Action::ToggleColor, name: "toggleColor", keys: &["c"], description: "toggle colors" },
    ActionEntry { action: Action::ResetScroll, name: "resetScroll", keys: &["r"], description: "reset scroll" },
    ActionEntry { action: Action::TabNext, name: "tabNext", keys: &["tab"], description: "next tab" },
    ActionEntry { action: Action::TabPrev, name: "tabPrev", keys: &["shift+tab"], description: "previous tab" },
    ActionEntry { action: Action::ClearBuffer, name: "clearBuffer", keys: &["ctrl+l"], description: "clear buffer" },
    ActionEntry { action: Action::ToggleWordWrap, name: "toggleWordWrap", keys: &["w"], description: "toggle word wrap" },
    ActionEntry { action: Action::ToggleTabPosition, name: "toggleTabPosition", keys: &["p"], description: "toggle tab position" },
    ActionEntry { action: Action::ToggleHelp, name: "toggleHelp", keys: &["?"], description: "toggle help" },
];

/// Position of each action in [`DEFAULT_BINDINGS`]
fn entry_index(action: Action) -> usize {
    match action {
        Action::Up => 0,
        Action::Down => 1,
        Action::Left => 2,
        Action::Right => 3,
        Action::PageUp => 4,
        Action::PageDown => 5,
        Action::Home => 6,
        Action::End => 7,
        Action::Quit => 8,
        Action::ToggleColor => 9,
        Action::ResetScroll => 10,
        Action::TabNext => 11,
        Action::TabPrev => 12,
        Action::ClearBuffer => 13,
        Action::ToggleWordWrap => 14,
        Action::ToggleTabPosition => 15,
        Action::ToggleHelp => 16,
    }
}

fn entry_for(action: Action) -> &'static ActionEntry {
    &DEFAULT_BINDINGS[entry_index(action)]
}

impl Action {
    pub fn all() -> impl Iterator<Item = Action> {
        DEFAULT_BINDINGS.iter().map(|entry| entry.action)
    }

    /// Key used for this action in the bindings file
    pub fn config_name(self) -> &'static str {
        entry_for(self).name
    }

    pub fn description(self) -> &'static str {
        entry_for(self).description
    }

    pub fn from_config_name(name: &str) -> Option<Action> {
        DEFAULT_BINDINGS
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.action)
    }

    fn default_keys(self) -> &'static [&'static str] {
        entry_for(self).keys
    }
}

/// One key combination, e.g. `ctrl+c` or `pgup`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyChord {
    pub fn parse(text: &str) -> Result<Self, KeyBindingError> {
        let unknown = || KeyBindingError::UnknownKey(text.to_string());

        let mut modifiers = KeyModifiers::NONE;
        let mut parts: Vec<&str> = text.split('+').collect();
        // A lone "+" splits into two empty strings
        if text.ends_with('+') {
            parts.pop();
            parts.pop();
            parts.push("+");
        }
        let key = parts.pop().filter(|k| !k.is_empty()).ok_or_else(unknown)?;

        for part in parts {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return Err(unknown()),
            }
        }

        let code = match key.to_ascii_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "pgup" | "pageup" => KeyCode::PageUp,
            "pgdown" | "pgdn" | "pagedown" => KeyCode::PageDown,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "tab" if modifiers.contains(KeyModifiers::SHIFT) => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::BackTab
            }
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "enter" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "space" => KeyCode::Char(' '),
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "insert" => KeyCode::Insert,
            lower => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => {
                        if modifiers.contains(KeyModifiers::SHIFT) {
                            modifiers.remove(KeyModifiers::SHIFT);
                            KeyCode::Char(c.to_ascii_uppercase())
                        } else {
                            KeyCode::Char(c)
                        }
                    }
                    _ => match lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                        Some(n @ 1..=12) => KeyCode::F(n),
                        _ => return Err(unknown()),
                    },
                }
            }
        };

        Ok(Self { code, modifiers })
    }

    /// Whether a terminal key event is this chord.
    ///
    /// SHIFT is ignored for characters and back-tab since the terminal
    /// already folds it into the reported code.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let relevant = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        let mut mods = event.modifiers & relevant;
        if matches!(event.code, KeyCode::Char(_) | KeyCode::BackTab) {
            mods.remove(KeyModifiers::SHIFT);
        }
        event.code == self.code && mods == self.modifiers
    }
}

#[derive(Debug, Clone)]
struct Binding {
    /// As written in the file, for help labels
    names: Vec<String>,
    chords: Vec<KeyChord>,
}

impl Binding {
    fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, KeyBindingError> {
        let chords = names
            .iter()
            .map(|n| KeyChord::parse(n.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            chords,
        })
    }
}

/// Resolved action → keys table
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: Vec<(Action, Binding)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        let bindings = DEFAULT_BINDINGS
            .iter()
            .filter_map(|entry| Binding::parse(entry.keys).ok().map(|b| (entry.action, b)))
            .collect();
        Self { bindings }
    }
}

/// On-disk layout of the bindings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyBindingsFile {
    #[serde(default)]
    pub keybinds: BTreeMap<String, Vec<String>>,
}

impl KeyBindingsFile {
    pub fn defaults() -> Self {
        let keybinds = DEFAULT_BINDINGS
            .iter()
            .map(|entry| {
                (
                    entry.name.to_string(),
                    entry.keys.iter().map(|k| k.to_string()).collect(),
                )
            })
            .collect();
        Self { keybinds }
    }
}

impl KeyMap {
    /// Build a map from a parsed bindings file, filling gaps with defaults
    pub fn from_file(file: &KeyBindingsFile) -> Result<Self, KeyBindingError> {
        for name in file.keybinds.keys() {
            if Action::from_config_name(name).is_none() {
                return Err(KeyBindingError::ParseError(format!(
                    "unknown action '{}'",
                    name
                )));
            }
        }

        let mut bindings = Vec::with_capacity(DEFAULT_BINDINGS.len());
        for action in Action::all() {
            let binding = match file.keybinds.get(action.config_name()) {
                Some(keys) if !keys.is_empty() => Binding::parse(keys)?,
                _ => Binding::parse(action.default_keys())?,
            };
            bindings.push((action, binding));
        }
        Ok(Self { bindings })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, KeyBindingError> {
        let file: KeyBindingsFile =
            toml::from_str(contents).map_err(|e| KeyBindingError::ParseError(e.to_string()))?;
        Self::from_file(&file)
    }

    /// `{config_dir}/herd/keybinds.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("herd").join("keybinds.toml"))
    }

    /// Load bindings from `explicit`, or from the default location.
    ///
    /// A missing file is written with the defaults so users have something
    /// to edit.
    pub fn load(explicit: Option<&Path>) -> Result<Self, KeyBindingError> {
        let Some(path) = explicit.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            save_defaults(&path)?;
            tracing::info!("Wrote default key bindings to {}", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            KeyBindingError::IoError(format!("failed to read {}: {}", path.display(), e))
        })?;
        let map = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded key bindings from {}", path.display());
        Ok(map)
    }

    /// First action whose keys match the event, in table order
    pub fn action_for(&self, event: &KeyEvent) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(_, binding)| binding.chords.iter().any(|c| c.matches(event)))
            .map(|(action, _)| *action)
    }

    pub fn keys(&self, action: Action) -> &[String] {
        self.bindings
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, b)| b.names.as_slice())
            .unwrap_or(&[])
    }

    /// Compact key label for help text, e.g. `↑/k` or `q/...`
    pub fn help_label(&self, action: Action) -> String {
        let keys: Vec<&str> = self.keys(action).iter().map(|k| pretty_key(k)).collect();
        match keys.as_slice() {
            [] => String::new(),
            [one] => one.to_string(),
            [a, b] => format!("{}/{}", a, b),
            [first, ..] => format!("{}/...", first),
        }
    }

    /// Actions listed in the one-line help
    pub fn short_help(&self) -> &'static [Action] {
        &[
            Action::Left,
            Action::Right,
            Action::Up,
            Action::Down,
            Action::ToggleColor,
            Action::ToggleHelp,
            Action::Quit,
        ]
    }

    /// Columns of the expanded help: tabs, scrolling, actions
    pub fn full_help(&self) -> [&'static [Action]; 3] {
        [
            &[
                Action::Left,
                Action::Right,
                Action::TabPrev,
                Action::TabNext,
                Action::ToggleTabPosition,
            ],
            &[
                Action::Up,
                Action::Down,
                Action::PageUp,
                Action::PageDown,
                Action::Home,
                Action::End,
                Action::ResetScroll,
            ],
            &[
                Action::ToggleColor,
                Action::ToggleWordWrap,
                Action::ClearBuffer,
                Action::ToggleHelp,
                Action::Quit,
            ],
        ]
    }
}

fn pretty_key(name: &str) -> &str {
    match name {
        "up" => "↑",
        "down" => "↓",
        "left" => "←",
        "right" => "→",
        other => other,
    }
}

fn save_defaults(path: &Path) -> Result<(), KeyBindingError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            KeyBindingError::IoError(format!("failed to create {}: {}", parent.display(), e))
        })?;
    }
    let contents = toml::to_string_pretty(&KeyBindingsFile::defaults())
        .map_err(|e| KeyBindingError::ParseError(e.to_string()))?;
    std::fs::write(path, contents).map_err(|e| {
        KeyBindingError::IoError(format!("failed to write {}: {}", path.display(), e))
    })
}

#[derive(Debug)]
pub enum KeyBindingError {
    IoError(String),
    ParseError(String),
    UnknownKey(String),
}

impl std::fmt::Display for KeyBindingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyBindingError::IoError(msg) => write!(f, "IO error: {msg}"),
            KeyBindingError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            KeyBindingError::UnknownKey(key) => write!(f, "Unknown key: {key}"),
        }
    }
}

impl std::error::Error for KeyBindingError {}
