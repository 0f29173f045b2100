//! cnc-monitor — live CNC machine telemetry in the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  watch::Receiver  ┌──────────┐  draw()  ┌──────────┐
//! │  poll.rs │ ────────────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (tokio)  │   ResourceState   │ (state)  │          │ (render) │
//! └──────────┘                   └──────────┘          └──────────┘
//!      ▲ activate(id)                 ▲
//!      │                              │ handle_key_event()
//!   main loop                    ┌──────────┐
//!                                │ input.rs │
//!                                └──────────┘
//! ```
//!
//! * **`source/`** — the `DataSource` trait, the HTTP implementation and the
//!   `SensorReading` payload.
//! * **`poll`** — the polling resource: fetch now, then every interval, for
//!   whichever machine is active.
//! * **`config`** — API endpoint, cadence, machine table, logging.
//! * **`presentation`** — status → colour/label mapping shared by all views.
//! * **`app`** — owns UI state (machine list, selection, latest telemetry).
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` mutations.
//! * **`main`** — wires everything together: parse args, load config, set up
//!   logging and the terminal, and run the event loop.

mod app;
mod config;
mod error;
mod input;
mod poll;
mod presentation;
mod source;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use config::{Config, MachineId};
use poll::PollingResource;
use source::{HttpSource, SensorReading};

/// Command-line flags.  Anything set here overrides the config file.
#[derive(Parser, Debug)]
#[command(name = "cnc-monitor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live CNC machine telemetry dashboard for the terminal")]
struct Cli {
    /// Config file (TOML).  Defaults to the platform config dir, then ./config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sensor API base URL, e.g. http://172.18.7.93:9898
    #[arg(long)]
    base_url: Option<String>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Machine id to show first
    #[arg(short, long)]
    machine: Option<MachineId>,

    /// Write logs here instead of the default data directory
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Resolve the config file, then layer CLI flags on top.
fn load_config(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    let path = cli.config.clone().or_else(Config::locate);
    let mut config = match &path {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    };

    if let Some(url) = &cli.base_url {
        config.api.base_url = url.clone();
    }
    if let Some(ms) = cli.interval_ms {
        config.api.poll_interval_ms = ms;
    }
    if let Some(ms) = cli.timeout_ms {
        config.api.request_timeout_ms = Some(ms);
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
    }

    config.validate()?;
    Ok((config, path))
}

/// Send `tracing` output to a file; stdout belongs to the TUI.
/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str, file: &Path) -> Result<()> {
    if let Some(dir) = file.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("opening log file {}", file.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("cnc_monitor={level}"))
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = load_config(&cli)?;
    init_logging(&config.logging.level, &config.logging.file_path())?;

    tracing::info!("cnc-monitor v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(p) => tracing::info!("Loaded config from {:?}", p),
        None => tracing::info!("Using default config"),
    }

    install_panic_hook();

    // -- start polling -------------------------------------------------------
    let source = HttpSource::new("sensor-api").with_timeout(config.request_timeout());
    let base_url = config.api.base_url.clone();
    let mut resource: PollingResource<MachineId, SensorReading> = PollingResource::new(
        Arc::new(source),
        move |id: &MachineId| config::sensor_url(&base_url, *id),
        config.poll_interval(),
    );
    let mut rx = resource.subscribe();
    tracing::info!(
        base_url = %config.api.base_url,
        interval_ms = resource.interval().as_millis() as u64,
        "sensor API configured"
    );

    let mut app = App::new(config.machine_list(), config.api.base_url.clone());
    if let Some(id) = cli.machine {
        match config.machine_name(id) {
            Some(name) => tracing::info!(machine = id, name, "starting on requested machine"),
            None => tracing::warn!(machine = id, "unknown machine id, starting on first machine"),
        }
        app.select_machine(id);
    }

    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Point the poller at the selected machine.
    //   2. Pick up the latest telemetry.
    //   3. Render the UI.
    //   4. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        // 1. Re-target polling (no-op while the selection is unchanged)
        match app.selected_id() {
            Some(id) => resource.activate(id),
            None => resource.deactivate(),
        }
        if std::mem::take(&mut app.refresh_requested) {
            resource.restart();
        }

        // 2. Process poll updates
        if rx.has_changed().unwrap_or(false) {
            app.apply_telemetry(rx.borrow_and_update().clone());
        }

        // 3. Render
        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        // 4. Handle input
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    if resource.is_active() {
        resource.deactivate();
    }
    let last = resource.snapshot();
    tracing::info!(
        status = ?last.status,
        last_updated = ?last.last_updated,
        "shutting down"
    );
    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
