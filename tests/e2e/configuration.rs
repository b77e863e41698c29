// End-to-end tests for the server and key binding files

use crate::common::harness::AppHarness;
use herd::config::{Config, Credential, OutputVisibility};
use herd::keybindings::KeyMap;
use std::fs;

const SERVERS: &str = r#"
[[servers]]
name = "web"
host = "10.0.0.5"
user = "deploy"
private_key_path = "/keys/deploy"
commands = ["tail -f /var/log/nginx/error.log"]

[[servers]]
name = "db"
host = "10.0.0.6"
port = 2222
user = "postgres"
password = "hunter2"
commands = ["uptime", "journalctl -f -u postgresql"]

[session]
max_lines = 200
output_visibility = "last_command"
"#;

#[test]
fn test_servers_file_drives_tabs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.toml");
    fs::write(&path, SERVERS).unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();
    assert_eq!(config.servers.len(), 2);
    assert_eq!(config.servers[1].address(), "10.0.0.6:2222");
    assert_eq!(
        config.servers[0].credential(),
        Some(Credential::PrivateKey("/keys/deploy".into()))
    );
    assert_eq!(config.session.output_visibility, OutputVisibility::LastCommand);

    let mut harness = AppHarness::with_max_lines(&config.servers, 80, 24, config.session.max_lines);
    harness.render();
    assert!(harness.screen_row(0).starts_with("  web  "));
    assert!(harness.screen_row(1).starts_with("  db  "));
    assert_eq!(
        harness.app.tab(0).unwrap().view().buffer().max_lines(),
        200
    );
}

#[test]
fn test_invalid_servers_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.toml");
    fs::write(&path, "[[servers]]\nname = \"web\"\nhost = \"\"\n").unwrap();

    assert!(Config::load(Some(path.as_path())).is_err());
}

#[test]
fn test_custom_key_bindings() {
    let keymap = KeyMap::from_toml_str("[keybinds]\nquit = [\"x\"]\ntabNext = [\"n\"]\n").unwrap();
    let targets = vec![
        crate::common::harness::target("web", &[]),
        crate::common::harness::target("db", &[]),
    ];
    let mut harness = AppHarness::with_keymap(&targets, keymap, 120, 24);
    harness.render();
    harness.assert_screen_contains("x quit");

    harness.press('n');
    assert_eq!(harness.app.active_index(), 1);

    harness.press('q');
    assert!(!harness.app.should_quit());
    harness.press('x');
    assert!(harness.app.should_quit());
}

#[test]
fn test_missing_key_bindings_file_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("herd").join("keybinds.toml");

    let keymap = KeyMap::load(Some(path.as_path())).unwrap();
    assert!(path.exists());
    assert_eq!(keymap.keys(herd::keybindings::Action::Quit), ["q", "ctrl+c"]);

    // The written file loads back to the same bindings
    let reloaded = KeyMap::from_toml_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(reloaded.keys(herd::keybindings::Action::Up), ["up", "k"]);
}
