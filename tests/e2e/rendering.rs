// End-to-end tests for layout, scrolling and toggles

use crate::common::harness::{target, AppHarness};
use crossterm::event::{KeyCode, KeyModifiers, MouseEventKind};
use herd::app::TabPlacement;
use herd::services::session::{SessionError, SessionEvent};
use ratatui::style::Color;

const WIDTH: u16 = 100;
const HEIGHT: u16 = 30;
/// Bottom border of the viewport: one row above the help line
const VIEWPORT_BOTTOM: u16 = HEIGHT - 2;

fn harness() -> AppHarness {
    AppHarness::new(&[target("web", &[]), target("db", &[])], WIDTH, HEIGHT)
}

fn numbered(count: usize) -> String {
    (0..count).map(|i| format!("line {}\n", i)).collect()
}

#[test]
fn test_initial_screen() {
    let mut harness = harness();
    harness.render();

    harness.assert_screen_contains("Connecting...");
    assert!(harness.screen_row(0).starts_with("  web  "));
    assert!(harness.screen_row(1).starts_with("  db  "));
    assert!(harness
        .screen_row(HEIGHT - 1)
        .starts_with("←/h previous tab • →/l next tab"));
}

#[test]
fn test_full_buffer_reported_in_help_line() {
    let mut harness = harness();
    harness.output(0, &numbered(1500));
    harness.render();

    assert_eq!(harness.app.tab(0).unwrap().view().buffer().line_count(), 1000);
    assert!(harness
        .screen_row(HEIGHT - 1)
        .contains("1000/1000 lines in buffer"));
    harness.assert_screen_contains("line 1499");
    harness.assert_screen_not_contains("line 499 ");
}

#[test]
fn test_buffer_info_hidden_below_half_and_with_full_help() {
    let mut harness = harness();
    harness.output(0, &numbered(100));
    harness.render();
    harness.assert_screen_not_contains("lines in buffer");

    harness.output(0, &numbered(600));
    harness.render();
    harness.assert_screen_contains("lines in buffer");

    harness.press('?');
    harness.assert_screen_not_contains("lines in buffer");
    harness.assert_screen_contains("toggle tab position");
    harness.assert_screen_contains("scroll to top");
}

#[test]
fn test_overflow_indicator_follows_position() {
    let mut harness = harness();
    harness.output(0, &numbered(100));
    harness.render();
    assert!(harness.screen_row(VIEWPORT_BOTTOM).contains('↑'));
    assert!(!harness.screen_row(VIEWPORT_BOTTOM).contains('↓'));

    harness.send_key(KeyCode::Home, KeyModifiers::NONE);
    assert!(harness.screen_row(VIEWPORT_BOTTOM).contains('↓'));
    assert!(!harness.screen_row(VIEWPORT_BOTTOM).contains('↑'));

    harness.send_key(KeyCode::PageDown, KeyModifiers::NONE);
    assert!(harness.screen_row(VIEWPORT_BOTTOM).contains("↑↓"));
}

#[test]
fn test_scroll_lock_holds_window_while_output_arrives() {
    let mut harness = harness();
    harness.output(0, &numbered(100));
    harness.render();

    harness.press('k');
    let offset = harness.app.tab(0).unwrap().view().offset();
    assert!(harness.app.tab(0).unwrap().view().scroll_locked());

    harness.output(0, &numbered(10));
    harness.render();
    assert_eq!(harness.app.tab(0).unwrap().view().offset(), offset);

    // End releases the lock and jumps to the newest output
    harness.press('G');
    let view = harness.app.tab(0).unwrap().view();
    assert!(!view.scroll_locked());
    assert!(view.is_at_bottom());
}

#[test]
fn test_scrolling_back_down_releases_lock() {
    let mut harness = harness();
    harness.output(0, &numbered(100));
    harness.render();

    harness.press('k');
    harness.press('k');
    assert!(harness.app.tab(0).unwrap().view().scroll_locked());
    harness.press('j');
    assert!(harness.app.tab(0).unwrap().view().scroll_locked());
    harness.press('j');
    assert!(!harness.app.tab(0).unwrap().view().scroll_locked());
}

#[test]
fn test_reset_scroll_and_clear_buffer() {
    let mut harness = harness();
    harness.output(0, &numbered(100));
    harness.render();

    harness.send_key(KeyCode::PageUp, KeyModifiers::NONE);
    assert!(harness.app.tab(0).unwrap().view().scroll_locked());
    harness.press('r');
    assert!(!harness.app.tab(0).unwrap().view().scroll_locked());

    harness.send_key(KeyCode::Char('l'), KeyModifiers::CONTROL);
    assert!(harness.app.tab(0).unwrap().view().buffer().is_empty());
    harness.assert_screen_not_contains("line 99");
}

#[test]
fn test_tab_switching_shows_other_buffer() {
    let mut harness = harness();
    harness.output(0, "from web\n");
    harness.output(1, "from db\n");
    harness.render();
    harness.assert_screen_contains("from web");
    harness.assert_screen_not_contains("from db");

    harness.send_key(KeyCode::Tab, KeyModifiers::NONE);
    assert_eq!(harness.app.active_index(), 1);
    harness.assert_screen_contains("from db");

    harness.send_key(KeyCode::Right, KeyModifiers::NONE);
    assert_eq!(harness.app.active_index(), 0);
}

#[test]
fn test_click_selects_vertical_tab() {
    let mut harness = harness();
    harness.render();

    harness.click(2, 1);
    assert_eq!(harness.app.active_index(), 1);

    // Below the last tab
    harness.click(2, 5);
    assert_eq!(harness.app.active_index(), 1);
}

#[test]
fn test_horizontal_tabs_and_click() {
    let mut harness = harness();
    harness.press('p');
    assert_eq!(harness.app.placement(), TabPlacement::Top);

    let bar = harness.screen_row(0);
    assert!(bar.starts_with("  web    db  "));

    // "  web  " spans columns 0..7, "  db  " 7..13
    harness.click(9, 0);
    assert_eq!(harness.app.active_index(), 1);
    harness.click(3, 0);
    assert_eq!(harness.app.active_index(), 0);
}

#[test]
fn test_mouse_wheel_scrolls() {
    let mut harness = harness();
    harness.output(0, &numbered(100));
    harness.render();
    let bottom = harness.app.tab(0).unwrap().view().offset();

    harness.mouse(MouseEventKind::ScrollUp, 50, 10);
    assert_eq!(harness.app.tab(0).unwrap().view().offset(), bottom - 3);
    assert!(harness.app.tab(0).unwrap().view().scroll_locked());

    harness.mouse(MouseEventKind::ScrollDown, 50, 10);
    assert!(!harness.app.tab(0).unwrap().view().scroll_locked());
}

#[test]
fn test_word_wrap_toggle() {
    let mut harness = harness();
    let long: String = (0..30).map(|i| format!("word{:02} ", i)).collect();
    harness.output(0, &format!("{}\n", long.trim_end()));
    harness.render();
    harness.assert_screen_not_contains("word29");

    harness.press('w');
    assert!(harness.app.word_wrap());
    harness.assert_screen_contains("word29");

    harness.press('w');
    harness.assert_screen_not_contains("word29");
}

#[test]
fn test_colorize_toggle_paints_levels() {
    let mut harness = harness();
    harness.output(0, "ERROR disk full\n");
    harness.render();

    let error_color = Color::Rgb(0xff, 0x55, 0x55);

    let (x, y) = harness.find_text("ERROR disk").unwrap();
    assert_ne!(harness.cell_fg(x, y), error_color);

    harness.press('c');
    assert!(harness.app.colorize());
    let (x, y) = harness.find_text("ERROR disk").unwrap();
    assert_eq!(harness.cell_fg(x, y), error_color);
}

#[test]
fn test_failed_tab_shows_error_only() {
    let mut harness = harness();
    harness.send(SessionEvent::ConnectFailed {
        index: 1,
        error: SessionError::Auth("permission denied".into()),
    });
    harness.press('l');
    harness.assert_screen_contains("Connection failed: authentication failed: permission denied");
    harness.assert_screen_not_contains("Connecting...");
}

#[test]
fn test_quit_key() {
    let mut harness = harness();
    harness.press('q');
    assert!(harness.app.should_quit());
}
