use std::io;
use std::time::Duration;

use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod ai;
mod app;
mod bookmarks;
mod config;
mod db;
mod error;
mod models;
mod services;
mod tui;

use app::App;
use config::Config;
use error::{AppError, Result};
use models::{ProcessResult, Selector};
use tui::{draw, handle_key_event};

/// Commands that run without the TUI and exit.
enum Headless {
    Sync,
    Process {
        selector: Selector,
        reprocess: bool,
        instructions: Option<String>,
    },
    List,
    Delete(i64),
    ShowSettings,
    SetInstructions(String),
}

fn parse_args(args: &[String]) -> Result<Option<Headless>> {
    let Some(flag) = args.get(1) else {
        return Ok(None);
    };
    let value = args.get(2);

    let id = || -> Result<i64> {
        value
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| AppError::Config(format!("{flag} expects an item id")))
    };

    let command = match flag.as_str() {
        "--sync" => Headless::Sync,
        "--process" => Headless::Process {
            selector: Selector::AllItems,
            reprocess: false,
            instructions: instructions_option(flag, &args[2..])?,
        },
        "--reprocess" => Headless::Process {
            selector: Selector::AllItems,
            reprocess: true,
            instructions: instructions_option(flag, &args[2..])?,
        },
        "--process-item" => Headless::Process {
            selector: Selector::SingleItem(id()?),
            reprocess: true,
            instructions: instructions_option(flag, &args[3..])?,
        },
        "--list" => Headless::List,
        "--delete" => Headless::Delete(id()?),
        "--show-settings" => Headless::ShowSettings,
        "--set-instructions" => Headless::SetInstructions(args[2..].join(" ")),
        other => return Err(AppError::Config(format!("unknown argument: {other}"))),
    };
    Ok(Some(command))
}

/// Parses the optional `--instructions <text>` that may follow a process flag.
fn instructions_option(flag: &str, rest: &[String]) -> Result<Option<String>> {
    match rest {
        [] => Ok(None),
        [option, text] if option == "--instructions" => Ok(Some(text.clone())),
        [option] if option == "--instructions" => Err(AppError::Config(
            "--instructions expects the instructions text".to_string(),
        )),
        [other, ..] => Err(AppError::Config(format!(
            "unexpected argument after {flag}: {other}"
        ))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args)?;

    let config = Config::load()?;
    let mut app = App::new(&config).await?;

    if let Some(command) = command {
        return run_headless(&app, command).await;
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_headless(app: &App, command: Headless) -> Result<()> {
    match command {
        Headless::Sync => {
            let result = app.sync().await?;
            println!("{} ({} skipped)", result.message(), result.skipped);
        }
        Headless::Process {
            selector,
            reprocess,
            instructions,
        } => {
            let result = app.process_with(selector, reprocess, instructions).await?;
            print_process_result(&result);
        }
        Headless::List => {
            let items = app.list_items().await?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Headless::Delete(id) => {
            app.delete_item(id).await?;
            println!("Item deleted");
        }
        Headless::ShowSettings => {
            let settings = app.get_settings().await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Headless::SetInstructions(text) => {
            app.save_settings(text).await?;
            println!("Settings updated");
        }
    }
    Ok(())
}

fn print_process_result(result: &ProcessResult) {
    println!("{}", result.message);
    for failure in &result.failed {
        println!("  #{} {}: {}", failure.id, failure.url, failure.error);
    }
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Poll for finished sync/process jobs
        app.poll_task_result().await?;

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) =
                        handle_key_event(key, app.instructions_input_active, app.show_help)
                    {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
