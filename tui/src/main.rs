//! Book chat terminal host
//!
//! # Usage
//!
//! ```bash
//! # Local backend (http://localhost:8005/api/chat)
//! bookchat-tui
//!
//! # Deployed backend
//! bookchat-tui --api-url https://books.example.com/api/chat
//!
//! # Logs to a file while the UI owns the screen
//! bookchat-tui --log-file /tmp/bookchat.log --log-level debug
//! ```

use std::fs::File;
use std::io::{self, IsTerminal};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::EnableMouseCapture;
use crossterm::execute;
use crossterm::terminal::{enable_raw_mode, EnterAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use bookchat_core::{default_config_path, load_config_from_path, HostEnvironment};
use bookchat_tui::app::restore_terminal;
use bookchat_tui::cli::Args;
use bookchat_tui::App;

/// Initialize logging with the specified level
fn init_logging(args: &Args) -> Result<()> {
    let level = &args.log_level;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("bookchat_tui={level},bookchat_core={level}"))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match args.log_file {
        Some(ref path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {path:?}"))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    // Layers: defaults, file, environment, then flags
    let mut config = load_config_from_path(args.config.clone().or_else(default_config_path))?;
    args.embed_options().apply(&mut config);

    // A terminal session runs on the reader's own machine
    if config.host == HostEnvironment::default() {
        config.host = HostEnvironment::localhost();
    }
    config.validate()?;

    info!(
        source = %config.source(),
        file = ?config.config_file_path(),
        "Configuration loaded"
    );

    if !io::stdout().is_terminal() {
        anyhow::bail!("bookchat-tui needs an interactive terminal");
    }

    // Restore the terminal before the panic message is printed
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        default_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new(config);
    let result = app.run(&mut terminal).await;

    restore_terminal()?;
    terminal.show_cursor()?;

    result
}
