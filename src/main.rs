use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use crossterm::event::{
    poll as event_poll, read as event_read, Event as CrosstermEvent, KeyEventKind, MouseEventKind,
};
use herd::app::App;
use herd::config::Config;
use herd::keybindings::KeyMap;
use herd::services::session::russh_transport::RusshConnector;
use herd::services::session::SessionManager;
use herd::services::{log_dirs, terminal_modes, terminal_modes::TerminalModes, tracing_setup};
use ratatui::Terminal;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// How long workers get to close their sessions on quit
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Run commands on many SSH hosts at once and follow their output
#[derive(Parser, Debug)]
#[command(name = "herd")]
#[command(about = "Tabbed live output from commands running on many SSH hosts", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the servers file (default: servers.toml, then config.toml)
    #[arg(long, value_name = "PATH")]
    servers: Option<PathBuf>,

    /// Path to the key bindings file (default: <config dir>/herd/keybinds.toml)
    #[arg(long, value_name = "PATH")]
    keybinds: Option<PathBuf>,

    /// Path to log file for diagnostics (default: state dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the files and directories used by herd and exit
    #[arg(long)]
    show_paths: bool,
}

struct SetupState {
    config: Config,
    keymap: KeyMap,
}

fn initialize_app(args: &Args) -> AnyhowResult<SetupState> {
    let log_file = args.log_file.clone().unwrap_or_else(log_dirs::main_log_path);
    tracing_setup::init_global(&log_file);

    // Clean up stale log files from dead processes on startup
    log_dirs::cleanup_stale_logs();

    tracing::info!("herd starting");

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        terminal_modes::emergency_cleanup();
        original_hook(panic);
    }));

    let config = Config::load(args.servers.as_deref())?;
    tracing::info!("Loaded {} server(s)", config.servers.len());

    let keymap = match KeyMap::load(args.keybinds.as_deref()) {
        Ok(keymap) => keymap,
        Err(e) => {
            tracing::warn!("Failed to load key bindings, using defaults: {}", e);
            KeyMap::default()
        }
    };

    Ok(SetupState { config, keymap })
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    if args.show_paths {
        let servers = Config::resolve_path(args.servers.as_deref());
        let keybinds = args.keybinds.clone().or_else(KeyMap::default_path);
        log_dirs::print_all_paths(&servers, keybinds.as_deref());
        return Ok(());
    }

    let SetupState { config, keymap } = match initialize_app(&args) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let (sender, receiver) = mpsc::channel();
    let mut app = App::new(
        &config.servers,
        keymap,
        config.session.max_lines,
        receiver,
    );
    let mut manager = SessionManager::new(
        runtime.handle().clone(),
        Arc::new(RusshConnector::new()),
        config.session.clone(),
        sender,
    );
    manager.connect_all(&config.servers);

    let mut terminal_modes = TerminalModes::enable()?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
    terminal.clear()?;

    let result = run_event_loop(&mut app, &mut terminal, |timeout| {
        if event_poll(timeout)? {
            Ok(Some(event_read()?))
        } else {
            Ok(None)
        }
    });

    runtime.block_on(manager.shutdown(SHUTDOWN_GRACE));
    terminal_modes.undo();
    drop(runtime);

    if let Err(e) = &result {
        tracing::error!("Event loop failed: {:#}", e);
    }
    result?;

    println!("Goodbye!");
    tracing::info!("herd exiting");
    Ok(())
}

fn run_event_loop<F>(
    app: &mut App,
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>,
    mut poll_event: F,
) -> AnyhowResult<()>
where
    F: FnMut(Duration) -> AnyhowResult<Option<CrosstermEvent>>,
{
    use std::time::Instant;

    const FRAME_DURATION: Duration = Duration::from_millis(16); // 60fps
    let mut last_render = Instant::now();
    let mut needs_render = true;
    let mut pending_event: Option<CrosstermEvent> = None;

    loop {
        if app.process_session_events() {
            needs_render = true;
        }

        if app.should_quit() {
            break;
        }

        if needs_render && last_render.elapsed() >= FRAME_DURATION {
            terminal.draw(|frame| app.render(frame))?;
            last_render = Instant::now();
            needs_render = false;
        }

        let event = if let Some(e) = pending_event.take() {
            Some(e)
        } else {
            let timeout = if needs_render {
                FRAME_DURATION.saturating_sub(last_render.elapsed())
            } else {
                Duration::from_millis(50)
            };

            poll_event(timeout)?
        };

        let Some(event) = event else { continue };

        let (event, next) = coalesce_mouse_moves(event)?;
        pending_event = next;

        match event {
            CrosstermEvent::Key(key_event) => {
                if key_event.kind == KeyEventKind::Press {
                    tracing::trace!(
                        "Key event received: code={:?}, modifiers={:?}",
                        key_event.code,
                        key_event.modifiers
                    );
                    app.handle_key(key_event);
                    needs_render = true;
                }
            }
            CrosstermEvent::Mouse(mouse_event) => {
                if app.handle_mouse(mouse_event) {
                    needs_render = true;
                }
            }
            CrosstermEvent::Resize(w, h) => {
                tracing::debug!("Terminal resized to {}x{}", w, h);
                needs_render = true;
            }
            _ => {}
        }
    }

    Ok(())
}

fn is_motion(event: &CrosstermEvent) -> bool {
    matches!(event, CrosstermEvent::Mouse(m) if m.kind == MouseEventKind::Moved)
}

/// Motion only re-syncs the scroll-lock, so a burst of moves collapses into
/// its last one. The first other event read while draining comes back too.
fn coalesce_mouse_moves(
    event: CrosstermEvent,
) -> AnyhowResult<(CrosstermEvent, Option<CrosstermEvent>)> {
    if !is_motion(&event) {
        return Ok((event, None));
    }

    let mut latest = event;
    while event_poll(Duration::ZERO)? {
        match event_read()? {
            next if is_motion(&next) => latest = next,
            other => return Ok((latest, Some(other))),
        }
    }
    Ok((latest, None))
}
