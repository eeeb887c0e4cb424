use std::sync::Arc;
use anyhow::Result;
use druh_core::{ChatController, CompletionClient, Config, GeminiClient, LocalSessionGate, SessionGate};
use tracing::info;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = logging::init()?;

    let config = Config::load()?;
    config.validate()?;
    info!(log = %log_path.display(), gated = config.require_sign_in, "starting");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, config).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, config: Config) -> Result<()> {
    let client: Arc<dyn CompletionClient> = Arc::new(GeminiClient::from_config(&config));

    let gate: Option<Arc<dyn SessionGate>> = if config.require_sign_in {
        Some(Arc::new(LocalSessionGate::new(config.profile.clone())))
    } else {
        None
    };

    let mut events = tui::EventHandler::new(gate.as_ref().map(|g| g.subscribe()));
    let chat = ChatController::new(client, gate.is_some(), config.loader);
    let mut app = App::new(chat, gate, events.sender());

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event)?,
            None => break,
        }
    }

    info!("shutting down");
    Ok(())
}
