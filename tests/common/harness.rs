//! Drive an [`App`] against an in-memory terminal

use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use herd::app::App;
use herd::config::{ServerTarget, SessionSettings};
use herd::keybindings::KeyMap;
use herd::services::session::SessionEvent;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::sync::mpsc;
use std::time::Duration;

/// A password target named `name` on host `{name}.example`
pub fn target(name: &str, commands: &[&str]) -> ServerTarget {
    ServerTarget {
        name: name.to_string(),
        host: format!("{}.example", name),
        port: 22,
        user: "ops".to_string(),
        private_key_path: None,
        password: Some("secret".to_string()),
        commands: commands.iter().map(|c| c.to_string()).collect(),
    }
}

/// Session settings with short, distinct delays for deterministic timing
/// under a paused clock
pub fn test_settings() -> SessionSettings {
    SessionSettings {
        connect_timeout_secs: 2,
        startup_delay_ms: 300,
        clear_on_start: true,
        settle_delay_ms: 100,
        command_delay_ms: 250,
        ..SessionSettings::default()
    }
}

pub struct AppHarness {
    pub app: App,
    terminal: Terminal<TestBackend>,
    sender: mpsc::Sender<SessionEvent>,
}

impl AppHarness {
    pub fn new(targets: &[ServerTarget], width: u16, height: u16) -> Self {
        Self::with_max_lines(targets, width, height, 1000)
    }

    pub fn with_max_lines(
        targets: &[ServerTarget],
        width: u16,
        height: u16,
        max_lines: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        let app = App::new(targets, KeyMap::default(), max_lines, receiver);
        Self::from_parts(app, sender, width, height)
    }

    pub fn with_keymap(targets: &[ServerTarget], keymap: KeyMap, width: u16, height: u16) -> Self {
        let (sender, receiver) = mpsc::channel();
        let app = App::new(targets, keymap, 1000, receiver);
        Self::from_parts(app, sender, width, height)
    }

    /// Wrap an app whose events come from elsewhere (e.g. a session manager)
    pub fn from_parts(
        app: App,
        sender: mpsc::Sender<SessionEvent>,
        width: u16,
        height: u16,
    ) -> Self {
        let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        Self {
            app,
            terminal,
            sender,
        }
    }

    pub fn sender(&self) -> mpsc::Sender<SessionEvent> {
        self.sender.clone()
    }

    /// Deliver an event as if a worker had sent it, then drain
    pub fn send(&mut self, event: SessionEvent) {
        self.sender.send(event).unwrap();
        self.app.process_session_events();
    }

    pub fn output(&mut self, index: usize, text: &str) {
        self.send(SessionEvent::Output {
            index,
            text: text.to_string(),
        });
    }

    pub fn render(&mut self) {
        let app = &mut self.app;
        self.terminal.draw(|frame| app.render(frame)).unwrap();
    }

    pub fn send_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        self.app.handle_key(KeyEvent::new(code, modifiers));
        self.render();
    }

    pub fn press(&mut self, c: char) {
        self.send_key(KeyCode::Char(c), KeyModifiers::NONE);
    }

    pub fn mouse(&mut self, kind: MouseEventKind, column: u16, row: u16) {
        self.app.handle_mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        });
        self.render();
    }

    pub fn click(&mut self, column: u16, row: u16) {
        self.mouse(MouseEventKind::Down(MouseButton::Left), column, row);
    }

    pub fn screen_row(&self, y: u16) -> String {
        let buffer = self.terminal.backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect()
    }

    pub fn cell_fg(&self, x: u16, y: u16) -> ratatui::style::Color {
        self.terminal.backend().buffer()[(x, y)].fg
    }

    /// Screen cell where `text` starts, searching row by row
    pub fn find_text(&self, text: &str) -> Option<(u16, u16)> {
        let buffer = self.terminal.backend().buffer();
        let wanted: Vec<String> = text.chars().map(String::from).collect();
        for y in 0..buffer.area.height {
            let row: Vec<&str> = (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect();
            if let Some(x) = row
                .windows(wanted.len())
                .position(|window| window.iter().zip(&wanted).all(|(a, b)| *a == b.as_str()))
            {
                return Some((x as u16, y));
            }
        }
        None
    }

    pub fn screen_to_string(&self) -> String {
        let height = self.terminal.backend().buffer().area.height;
        (0..height)
            .map(|y| self.screen_row(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn assert_screen_contains(&self, text: &str) {
        let screen = self.screen_to_string();
        assert!(
            screen.contains(text),
            "Expected screen to contain {:?}\nScreen:\n{}",
            text,
            screen
        );
    }

    pub fn assert_screen_not_contains(&self, text: &str) {
        let screen = self.screen_to_string();
        assert!(
            !screen.contains(text),
            "Expected screen not to contain {:?}\nScreen:\n{}",
            text,
            screen
        );
    }

    /// Lines stored for tab `index`
    pub fn buffer_lines(&self, index: usize) -> Vec<String> {
        self.app
            .tab(index)
            .map(|tab| tab.view().buffer().lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Drain events until `done` holds, letting the runtime make progress in
    /// between. Returns false if it never did.
    pub async fn pump_until<F>(&mut self, mut done: F) -> bool
    where
        F: FnMut(&App) -> bool,
    {
        for _ in 0..500 {
            self.app.process_session_events();
            if done(&self.app) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

/// Whether tab `index` has stored `line`
pub fn tab_has_line(app: &App, index: usize, line: &str) -> bool {
    app.tab(index)
        .is_some_and(|tab| tab.view().buffer().lines().any(|l| l == line))
}
