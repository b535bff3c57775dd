mod app;
mod config;
mod confirmation;
mod form;
mod motion;
mod submission;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, View};
use config::AppConfig;
use confirmation::Confirmation;
use form::FieldKind;
use submission::DurableSlot;

#[derive(Parser, Debug)]
#[command(name = "formgate")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "A terminal contact form with validated, single-slot submission")]
struct Args {
    /// Show the last submission's confirmation details and clear it
    #[arg(short, long)]
    confirmation: bool,

    /// Print the stored submission as JSON without clearing it
    #[arg(short, long)]
    peek: bool,

    /// Check a value against a field rule (kinds: text, email, tel, other)
    #[arg(long, num_args = 2, value_names = ["KIND", "VALUE"])]
    validate: Option<Vec<String>>,

    /// Treat the --validate value as a required field
    #[arg(long, requires = "validate")]
    required: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Handle CLI-only commands
    if let Some(parts) = args.validate {
        return print_validation(&parts, args.required);
    }

    let config = AppConfig::load().unwrap_or_default();

    if args.confirmation {
        return print_confirmation(&config);
    }

    if args.peek {
        return print_slot(&config);
    }

    // Run TUI
    run_tui(config).await
}

fn slot_for(config: &AppConfig) -> Result<DurableSlot> {
    match &config.slot_path {
        Some(path) => Ok(DurableSlot::at(path)),
        None => DurableSlot::default_location(),
    }
}

fn print_validation(parts: &[String], required: bool) -> Result<()> {
    let [kind, value] = parts else {
        anyhow::bail!("--validate takes a KIND and a VALUE");
    };
    let kind = FieldKind::parse(kind).with_context(|| format!("Unknown field kind: {}", kind))?;

    let verdict = form::check_value(value, required, kind);
    let output = serde_json::json!({
        "kind": kind,
        "valid": verdict.is_ok(),
        "error": verdict.err().map(|e| e.to_string()),
    });

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn print_confirmation(config: &AppConfig) -> Result<()> {
    let slot = slot_for(config)?;
    match slot.take().context("Could not read stored submission")? {
        Some(record) => println!("{}", Confirmation::from_record(&record).to_text()),
        None => println!("No submission waiting"),
    }
    Ok(())
}

fn print_slot(config: &AppConfig) -> Result<()> {
    let slot = slot_for(config)?;
    match slot.peek().context("Could not read stored submission")? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("null"),
    }
    Ok(())
}

async fn run_tui(config: AppConfig) -> Result<()> {
    // Create app state before touching the terminal so errors print normally
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.view == View::Confirmation && !app.show_help => {
                            return Ok(())
                        }
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key) {
                                tracing::warn!("Key handling failed: {}", e);
                            }
                        }
                    }
                }
            }
        }

        // Periodic refresh
        if let Err(e) = app.tick().await {
            tracing::warn!("Tick failed: {}", e);
        }
    }
}
