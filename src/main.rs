//! recdeck - terminal client for an EPGStation recording server
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! recdeck
//!
//! # Open one recording's Detail screen
//! recdeck detail 1234
//!
//! # CLI mode (for automation)
//! recdeck list --keyword ニュース --json
//! recdeck related 1234
//! recdeck play 1234 --file 0
//! ```

use std::io::{stdout, Stdout};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use recdeck::app::{App, PendingPlayback};
use recdeck::cli::{Cli, Command, ExitCode, Output};
use recdeck::commands;
use recdeck::config::Config;
use recdeck::playback::{self, PlaybackOutcome};

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

const DEFAULT_LOG_FILTER: &str = "info,hyper_util=warn,reqwest=warn,hyper=warn";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = cli.load_config();
    info!(server = %config.server_url, api = %config.api_version, "recdeck starting");

    if cli.is_cli_mode() {
        // CLI mode: execute command and exit
        let exit_code = run_cli(cli, &config).await;
        std::process::exit(exit_code.into());
    }

    let entry = match &cli.command {
        Some(Command::Detail(cmd)) => match commands::detail_entry(cmd.id, &config).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                let output = Output::new(&cli);
                let code = output.error(format!("Could not open recording {}: {}", cmd.id, e), ExitCode::NotFound);
                std::process::exit(code.into());
            }
        },
        _ => None,
    };

    if cli.config.is_none() {
        write_default_config();
    }

    run_tui(config, entry).await
}

/// First TUI run: leave a config file with the defaults to edit
fn write_default_config() {
    let Some(path) = Config::path() else {
        return;
    };
    if path.exists() {
        return;
    }
    match Config::default().save() {
        Ok(()) => info!(path = %path.display(), "wrote default config"),
        Err(e) => warn!(error = %e, "could not write default config"),
    }
}

/// Log to a file in the user data dir; the terminal belongs to the UI
fn init_logging() {
    let Some(dir) = dirs::data_dir().map(|d| d.join("recdeck")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("recdeck.log"))
    else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_writer(file)
        .with_env_filter(filter)
        .with_ansi(false)
        .try_init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: &Config) -> ExitCode {
    let output = Output::new(&cli);

    match cli.command {
        Some(Command::List(cmd)) => commands::list_cmd(cmd, config, &output).await,
        Some(Command::Show(cmd)) => commands::show_cmd(cmd, config, &output).await,
        Some(Command::Related(cmd)) => commands::related_cmd(cmd, config, &output).await,
        Some(Command::Title(cmd)) => commands::title_cmd(cmd, &output),
        Some(Command::Play(cmd)) => commands::play_cmd(cmd, config, &output).await,
        // Interactive; handled by is_cli_mode check
        Some(Command::Detail(_)) | None => ExitCode::Success,
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run interactive TUI, optionally starting on a Detail screen
async fn run_tui(config: Config, entry: Option<recdeck::app::Entry>) -> Result<()> {
    let mut terminal = init_terminal()?;

    let mut app = App::new(config);
    app.load_home();
    if let Some(entry) = entry {
        app.open_entry(&entry);
    }

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;

    result
}

/// Main event loop - handles input, applies background completions, renders
async fn run_event_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
    const TICK_RATE: Duration = Duration::from_millis(100);

    while app.running {
        terminal.draw(|frame| recdeck::ui::render(frame, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (ignore releases on Windows)
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        app.poll_background();

        if let Some(pending) = app.take_playback() {
            start_playback(app, pending).await;
        }
    }

    Ok(())
}

async fn start_playback(app: &mut App, pending: PendingPlayback) {
    let install_url = app.config.player_install_url.clone();
    match playback::execute(&pending.request, &pending.session, &install_url).await {
        Ok(PlaybackOutcome::Started { player, url }) => {
            info!(%player, %url, "player started");
        }
        Ok(PlaybackOutcome::PlayerMissing { notice }) => app.set_notice(notice),
        Err(e) => {
            error!(error = %e, "playback failed");
            app.set_notice(e.to_string());
        }
    }
}
