//! Ruang Hampa terminal application.
//!
//! An interactive narrative about depression and family dynamics.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-oriented interface suitable for scripting:
//!
//! ```bash
//! cargo run -p hampa -- --headless --no-save
//! ```

mod app;
mod events;
mod headless;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use hampa_core::assets::{AssetRegistry, AssetValidator};
use hampa_core::{Engine, EngineConfig};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

/// Ruang Hampa: a narrative simulation about depression and family.
#[derive(Parser, Debug)]
#[command(name = "hampa", version, about)]
struct Args {
    /// Run in headless mode (text only, no TUI)
    #[arg(long)]
    headless: bool,

    /// Directory for save and settings files
    #[arg(long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Story JSON file to play instead of the bundled story
    #[arg(long, value_name = "FILE")]
    story: Option<PathBuf>,

    /// Directory holding scene images
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Keep progress in memory only
    #[arg(long)]
    no_save: bool,

    /// Log file used in TUI mode
    #[arg(long, env = "HAMPA_LOG_FILE", default_value = "hampa.log")]
    log_file: PathBuf,
}

impl Args {
    /// Environment configuration with command line overrides applied.
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::from_env();
        if let Some(dir) = &self.save_dir {
            config = config.with_save_dir(dir);
        }
        if let Some(path) = &self.story {
            config = config.with_story_path(path);
        }
        if let Some(dir) = &self.assets {
            config = config.with_asset_dir(dir);
        }
        config.with_memory_storage(self.no_save)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = args.engine_config();

    if args.headless {
        init_logging(LogTarget::Stderr)?;
        return headless::run_headless(&config);
    }

    init_logging(LogTarget::File(&args.log_file))?;
    tracing::info!("Starting Ruang Hampa");

    let mut engine = Engine::from_config(&config).context("Failed to start the story engine")?;
    engine.load_settings();
    let validator = AssetValidator::new(AssetRegistry::builtin(), config.asset_dir());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(engine, validator));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application error");
    }
    result.context("Terminal error")
}

enum LogTarget<'a> {
    Stderr,
    File(&'a PathBuf),
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
fn init_logging(target: LogTarget<'_>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match target {
        LogTarget::Stderr => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
        LogTarget::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, &app))?;

        // Poll for events with timeout so reveals and toasts animate
        if event::poll(Duration::from_millis(50))? {
            let ev = event::read()?;
            if handle_event(&mut app, ev) == EventResult::Quit {
                return Ok(());
            }
        }

        app.tick();

        if app.should_quit {
            return Ok(());
        }
    }
}
