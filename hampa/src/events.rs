//! Event handling for the Ruang Hampa TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Phase};
use crate::ui::Overlay;

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Global shortcuts (always work)
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    if let Some(overlay) = app.overlay() {
        return handle_overlay_key(app, overlay, key);
    }

    let result = match app.phase() {
        Phase::MainMenu => handle_menu_key(app, key),
        Phase::Intro => handle_intro_key(app, key),
        Phase::Playing => handle_playing_key(app, key),
    };

    if app.should_quit {
        EventResult::Quit
    } else {
        result
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => EventResult::Quit,
        KeyCode::Up | KeyCode::Char('k') => {
            app.menu_move(-1);
            EventResult::NeedsRedraw
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.menu_move(1);
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            app.menu_activate();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_intro_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Esc => {
            app.advance_intro();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_playing_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('q') => EventResult::Quit,

        // Overlays
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('l') => {
            app.toggle_journal();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('s') => {
            app.open_settings();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('w') => {
            app.save();
            EventResult::NeedsRedraw
        }

        // Reveal and selection
        KeyCode::Char(' ') => {
            app.skip_reveal();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            app.activate();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(index) = c.to_digit(10) {
                app.choose(index as usize - 1);
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.move_selection(-1);
            EventResult::NeedsRedraw
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.move_selection(1);
            EventResult::NeedsRedraw
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.cycle_focus();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_overlay_key(app: &mut App, overlay: Overlay, key: KeyEvent) -> EventResult {
    match (overlay, key.code) {
        (Overlay::Settings, KeyCode::Left | KeyCode::Char('-')) => {
            app.adjust_pending_speed(-5);
        }
        (Overlay::Settings, KeyCode::Right | KeyCode::Char('+')) => {
            app.adjust_pending_speed(5);
        }
        (Overlay::Settings, KeyCode::Enter) => app.apply_settings(),
        (Overlay::Settings, KeyCode::Char('r')) => app.request_reset(),
        (Overlay::ConfirmReset, KeyCode::Char('y')) => app.confirm_reset(),
        (Overlay::ConfirmReset, KeyCode::Char('n')) => app.close_overlay(),
        (Overlay::Help, KeyCode::Char('?')) | (Overlay::Journal, KeyCode::Char('l')) => {
            app.close_overlay();
        }
        (_, KeyCode::Esc | KeyCode::Char('q')) => app.close_overlay(),
        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use hampa_core::assets::{AssetRegistry, AssetValidator};
    use hampa_core::persist::MemoryStorage;
    use hampa_core::testing::{sample_graph, FixedClock};
    use hampa_core::Engine;
    use std::sync::Arc;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn test_app() -> App {
        let engine = Engine::new(Arc::new(sample_graph()), Arc::new(MemoryStorage::new()))
            .with_clock(FixedClock::default());
        App::new(
            engine,
            AssetValidator::new(AssetRegistry::builtin(), "missing-assets"),
        )
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_overlay() {
        let mut app = test_app();
        app.toggle_help();
        let event = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(handle_event(&mut app, event), EventResult::Quit);
    }

    #[tokio::test]
    async fn test_number_keys_choose() {
        let mut app = test_app();
        handle_event(&mut app, key(KeyCode::Enter)); // new game
        handle_event(&mut app, key(KeyCode::Enter)); // finish intro text
        handle_event(&mut app, key(KeyCode::Enter)); // leave intro
        assert_eq!(app.phase(), Phase::Playing);

        handle_event(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.engine.current_node_id(), "PHONE");

        // Out of range numbers are ignored.
        handle_event(&mut app, key(KeyCode::Char('9')));
        assert_eq!(app.engine.current_node_id(), "PHONE");
    }

    #[tokio::test]
    async fn test_settings_keys() {
        let mut app = test_app();
        handle_event(&mut app, key(KeyCode::Enter));
        handle_event(&mut app, key(KeyCode::Esc));
        handle_event(&mut app, key(KeyCode::Esc));

        handle_event(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.overlay(), Some(Overlay::Settings));
        handle_event(&mut app, key(KeyCode::Left));
        assert_eq!(app.pending_speed(), 25);
        handle_event(&mut app, key(KeyCode::Enter));

        assert!(app.overlay().is_none());
        assert_eq!(app.engine.typing_speed(), 25);
    }

    #[tokio::test]
    async fn test_reset_confirmation_can_be_cancelled() {
        let mut app = test_app();
        handle_event(&mut app, key(KeyCode::Enter));
        handle_event(&mut app, key(KeyCode::Esc));
        handle_event(&mut app, key(KeyCode::Esc));

        handle_event(&mut app, key(KeyCode::Char('s')));
        handle_event(&mut app, key(KeyCode::Char('r')));
        assert_eq!(app.overlay(), Some(Overlay::ConfirmReset));
        handle_event(&mut app, key(KeyCode::Char('n')));
        assert_eq!(app.overlay(), Some(Overlay::Settings));
        assert!(app.engine.has_saved_game());
    }
}
