use std::sync::Arc;
use druh_core::{ChatController, SessionGate};
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::tui::AppEvent;

/// Tallest the input box grows before it starts scrolling, in text rows.
pub const MAX_INPUT_ROWS: usize = 6;

pub struct App {
    pub should_quit: bool,
    pub chat: ChatController,
    pub gate: Option<Arc<dyn SessionGate>>,

    // Blocking popup (sign-in failures)
    pub alert: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for the loading indicator

    // History panel scroll offset
    pub history_scroll: u16,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub history_area: Option<Rect>,
    pub chat_height: u16,

    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        chat: ChatController,
        gate: Option<Arc<dyn SessionGate>>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            chat,
            gate,
            alert: None,
            animation_frame: 0,
            history_scroll: 0,
            chat_area: None,
            history_area: None,
            chat_height: 0,
            events,
        }
    }

    /// Submit the composer contents; the reply comes back as `AppEvent::Completed`.
    pub fn submit(&mut self) {
        if let Some(pending) = self.chat.submit_input() {
            let tx = self.events.clone();
            tokio::spawn(async move {
                let done = pending.run().await;
                if tx.send(AppEvent::Completed(done)).is_err() {
                    error!("event loop gone, completion discarded");
                }
            });
        }
    }

    pub fn sign_in(&mut self) {
        let Some(gate) = self.gate.clone() else {
            return;
        };
        if self.chat.user().is_some() {
            return;
        }

        info!("sign-in requested");
        let tx = self.events.clone();
        tokio::spawn(async move {
            if let Err(err) = gate.sign_in().await {
                info!(error = %err, "sign-in failed");
                let _ = tx.send(AppEvent::Alert(err.to_string()));
            }
        });
    }

    pub fn sign_out(&mut self) {
        if let Some(gate) = &self.gate {
            gate.sign_out();
        }
    }

    pub fn show_alert(&mut self, message: String) {
        self.alert = Some(message);
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.transcript().is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat.transcript_mut().scroll_up(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat.transcript_mut().scroll_down(lines);
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}
