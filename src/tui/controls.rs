//! Keyboard input handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::App;

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Char(' ') => app.toggle_running(),
        KeyCode::Char('r') => app.reset(),
        KeyCode::Char('+' | '=') | KeyCode::Right => app.speed_up(),
        KeyCode::Char('-') | KeyCode::Left => app.speed_down(),
        KeyCode::Char('[') => app.nudge_low_threshold(-1.0),
        KeyCode::Char(']') => app.nudge_low_threshold(1.0),
        KeyCode::Char('{') => app.nudge_high_threshold(-1.0),
        KeyCode::Char('}') => app.nudge_high_threshold(1.0),
        KeyCode::Char('t') => app.nudge_pwm_timer(-1.0),
        KeyCode::Char('T') => app.nudge_pwm_timer(1.0),
        KeyCode::Char('s') => app.nudge_sunlight(-1.0),
        KeyCode::Char('S') => app.nudge_sunlight(1.0),
        KeyCode::Char('l') => app.nudge_load(-1.0),
        KeyCode::Char('L') => app.nudge_load(1.0),
        _ => {}
    }
}
