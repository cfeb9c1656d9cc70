//! typeahead - a demo form of two typeahead fields in the terminal.
//!
//! Country and City fields search an in-process catalog with simulated
//! latency. Arrow keys move through the dropdown, Enter or Tab commits and
//! Escape cancels.

use std::io::{self, Stdout};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use typeahead::app::App;
use typeahead::catalog::Places;
use typeahead::config::{Config, Settings};
use typeahead::events::EventHandler;
use typeahead::logging;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "typeahead", version, about = "Typeahead fields in the terminal")]
struct Cli {
    /// JSON file with `countries` and `cities` record lists.
    #[arg(long, value_name = "PATH")]
    items: Option<PathBuf>,

    /// Config file to read instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Simulated lookup latency in milliseconds.
    #[arg(long, value_name = "MS")]
    latency_ms: Option<u64>,

    /// Maximum number of candidates per lookup.
    #[arg(long, value_name = "N")]
    max_results: Option<usize>,

    /// Don't preview the focused candidate in the field.
    #[arg(long)]
    no_preview: bool,

    /// Keep the value when an empty field is committed.
    #[arg(long)]
    no_clear: bool,

    /// Write the effective settings to the config file and exit.
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(latency_ms) = self.latency_ms {
            settings.latency_ms = latency_ms;
        }
        if let Some(max_results) = self.max_results {
            settings.max_results = max_results;
        }
        if self.no_preview {
            settings.preview = false;
        }
        if self.no_clear {
            settings.allow_clear = false;
        }
    }
}

type Tui = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    let mut settings = config.settings;
    cli.apply(&mut settings);
    settings.validate().context("Invalid settings")?;

    if cli.write_config {
        let config = Config { settings };
        match &cli.config {
            Some(path) => config.save_to(path),
            None => config.save(),
        }
        .context("Failed to write configuration")?;
        println!("Configuration written");
        return Ok(());
    }

    logging::init(settings.log_filter.as_deref())?;

    let places = match &cli.items {
        Some(path) => Places::load(path),
        None => Places::builtin(),
    }
    .context("Failed to load catalog")?;

    let mut terminal = setup_terminal()?;
    install_panic_hook();

    let result = run(&mut terminal, settings, places);

    restore_terminal(&mut terminal)?;
    if let Err(e) = &result {
        error!(error = %e, "Exited with error");
    }
    logging::shutdown();
    result
}

fn run(terminal: &mut Tui, settings: Settings, places: Places) -> anyhow::Result<()> {
    let events = EventHandler::with_tick_rate(settings.tick_rate_ms);
    let mut app = App::new(settings, places).map_err(|e| {
        error!(critical = e.is_critical(), error = %e, "Failed to build form");
        anyhow::anyhow!(e.user_message())
    })?;
    info!("Form ready");

    while !app.should_quit() {
        terminal.draw(|frame| app.view(frame))?;
        let event = events.next()?;
        app.update(event);
        app.poll_lookups();
    }
    Ok(())
}

fn setup_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Leave raw mode before the default hook prints the panic.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::parse_from([
            "typeahead",
            "--latency-ms",
            "5",
            "--max-results",
            "3",
            "--no-preview",
            "--no-clear",
        ]);
        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.latency_ms, 5);
        assert_eq!(settings.max_results, 3);
        assert!(!settings.preview);
        assert!(!settings.allow_clear);
    }

    #[test]
    fn test_cli_defaults_leave_settings_alone() {
        let cli = Cli::parse_from(["typeahead"]);
        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings, Settings::default());
        assert!(cli.items.is_none());
        assert!(!cli.write_config);
    }
}
