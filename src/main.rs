use anyhow::Result;
use clap::Parser;
use tracing::info;

mod app;
mod chat;
mod config;
mod handler;
mod logging;
mod news;
mod relay;
mod text;
mod tui;
mod ui;

use app::App;
use config::Config;
use tui::{AppEvent, EventHandler, Tui};

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Terminal news reader with an AI support chat panel")]
struct Cli {
    /// Initial search query; top headlines when omitted
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    logging::init(&Config::config_dir()?.join("newsdesk.log"))?;
    info!("starting newsdesk v{}", env!("CARGO_PKG_VERSION"));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(&config);

    // Initial load
    handler::dispatch_fetch(&mut app, cli.query.unwrap_or_default());

    let result = run(&mut terminal, &mut events, &mut app).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };

        let is_tick = matches!(event, AppEvent::Tick);
        handler::handle_event(app, event);

        // Completed network tasks are collected on the tick cadence
        if is_tick {
            harvest_tasks(app).await;
        }
    }
    Ok(())
}

/// Await tasks that have already finished and publish their results.
async fn harvest_tasks(app: &mut App) {
    for (seq, task) in app.take_finished_fetches() {
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("fetch task failed: {e}")),
        };
        app.apply_fetch(seq, result);
    }

    if let Some(task) = app.chat.take_finished() {
        match task.await {
            Ok(result) => app.chat.resolve(result),
            // Aborted sends were superseded; nothing to publish
            Err(e) if e.is_cancelled() => {}
            Err(e) => app.chat.resolve(Err(anyhow::anyhow!("chat task failed: {e}"))),
        }
    }
}
