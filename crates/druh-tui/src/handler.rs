use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::debug;

use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Completed(done) => app.chat.finish(done),
        AppEvent::Session(state) => {
            debug!(signed_in = state.is_signed_in(), "session state changed");
            app.chat.on_session(state);
        }
        AppEvent::Alert(message) => app.show_alert(message),
        AppEvent::InputClosed => app.should_quit = true,
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any mode
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        app.should_quit = true;
        return;
    }

    // An open alert swallows everything until dismissed
    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            app.dismiss_alert();
        }
        return;
    }

    match key.code {
        KeyCode::Char('l') if ctrl => app.sign_in(),
        KeyCode::Char('o') if ctrl => app.sign_out(),

        // Transcript scrolling
        KeyCode::PageUp => {
            let lines = app.half_page();
            app.scroll_chat_up(lines);
        }
        KeyCode::PageDown => {
            let lines = app.half_page();
            app.scroll_chat_down(lines);
        }

        // Enter sends; Shift/Alt+Enter (or Ctrl+J) breaks the line
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            edit(app, |composer| composer.insert_newline());
        }
        KeyCode::Char('j') if ctrl => edit(app, |composer| composer.insert_newline()),
        KeyCode::Enter => app.submit(),

        KeyCode::Backspace => edit(app, |composer| composer.backspace()),
        KeyCode::Delete => edit(app, |composer| composer.delete()),
        KeyCode::Left => edit(app, |composer| composer.move_left()),
        KeyCode::Right => edit(app, |composer| composer.move_right()),
        KeyCode::Home => edit(app, |composer| composer.move_home()),
        KeyCode::End => edit(app, |composer| composer.move_end()),
        KeyCode::Char(c) if !ctrl => edit(app, |composer| composer.insert(c)),

        _ => {}
    }
}

/// Apply an edit to the input field if it is enabled, then let the
/// controller re-evaluate the send button.
fn edit(app: &mut App, f: impl FnOnce(&mut druh_core::Composer)) {
    if !app.chat.composer().is_enabled() {
        return;
    }
    f(app.chat.composer_mut());
    app.chat.input_changed();
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Determine which area the mouse is in (position-based scrolling)
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_history = app.history_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_chat_down(3);
            } else if in_history {
                app.history_scroll = app.history_scroll.saturating_add(1);
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_chat_up(3);
            } else if in_history {
                app.history_scroll = app.history_scroll.saturating_sub(1);
            }
        }
        _ => {}
    }
}
