use std::io::{self, Stderr};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use druh_core::{Completed, SessionState};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::{Stream, StreamExt};
use tracing::{error, info};
use tokio::sync::{mpsc, watch};

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug)]
#[allow(dead_code)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    /// A completion request finished on its background task.
    Completed(Completed),
    /// The sign-in gate emitted a state.
    Session(SessionState),
    /// Something to show in a blocking popup.
    Alert(String),
    /// The terminal stopped delivering input; nothing can drive the UI anymore.
    InputClosed,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    pub fn new(session: Option<watch::Receiver<SessionState>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // Spawn event reader task
        let tx_events = tx.clone();
        tokio::spawn(forward_terminal_events(event::EventStream::new(), tx_events));

        // Spawn tick timer for the loading animation (300ms interval)
        let tx_tick = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(300));
            loop {
                interval.tick().await;
                if tx_tick.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        // Forward the gate's state signal, starting with its current value
        if let Some(mut session) = session {
            let tx_session = tx.clone();
            tokio::spawn(async move {
                loop {
                    let state = session.borrow_and_update().clone();
                    if tx_session.send(AppEvent::Session(state)).is_err() {
                        break;
                    }
                    if session.changed().await.is_err() {
                        break;
                    }
                }
            });
        }

        Self { rx, tx }
    }

    /// For background tasks that report back into the event loop.
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

/// Pumps terminal input into the event channel until the stream ends, fails,
/// or the loop stops listening. Any end of input is reported as
/// `AppEvent::InputClosed`.
async fn forward_terminal_events<S>(mut reader: S, tx: mpsc::UnboundedSender<AppEvent>)
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    loop {
        let evt = match reader.next().await {
            Some(Ok(evt)) => evt,
            Some(Err(err)) => {
                error!(error = %err, "terminal event stream failed");
                break;
            }
            None => {
                info!("terminal event stream ended");
                break;
            }
        };

        if let Some(event) = map_terminal_event(evt) {
            if tx.send(event).is_err() {
                return;
            }
        }
    }
    let _ = tx.send(AppEvent::InputClosed);
}

fn map_terminal_event(evt: Event) -> Option<AppEvent> {
    match evt {
        // Only handle key press events, not release
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen)?;

    // Enable mouse capture
    execute!(io::stderr(), crossterm::event::EnableMouseCapture)?;

    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), crossterm::event::DisableMouseCapture)?;
    execute!(io::stderr(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
