use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};

use super::keybindings::{Action, KeyBindings};
use crate::constants::WHEEL_STEP_ROWS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Quit,
    Action(Action),
    /// Mouse wheel over the timeline, in rows (negative is up)
    Scroll(i32),
    /// The terminal got focus back
    FocusGained,
    Resize { width: u16, height: u16 },
}

pub fn handle_input(event: Event, bindings: &KeyBindings) -> InputResult {
    match event {
        Event::Key(key_event) => handle_key(key_event, bindings),
        Event::Mouse(mouse_event) => handle_mouse(mouse_event),
        Event::FocusGained => InputResult::FocusGained,
        Event::Resize(width, height) => InputResult::Resize { width, height },
        _ => InputResult::Continue,
    }
}

fn handle_key(key: KeyEvent, bindings: &KeyBindings) -> InputResult {
    // Only presses; some terminals also report releases
    if key.kind != KeyEventKind::Press {
        return InputResult::Continue;
    }

    match bindings.get(&key) {
        Some(Action::Quit) => InputResult::Quit,
        Some(action) => InputResult::Action(action),
        None => InputResult::Continue,
    }
}

fn handle_mouse(mouse: MouseEvent) -> InputResult {
    let rows = WHEEL_STEP_ROWS as i32;
    match mouse.kind {
        MouseEventKind::ScrollUp => InputResult::Scroll(-rows),
        MouseEventKind::ScrollDown => InputResult::Scroll(rows),
        _ => InputResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeybindingMode;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_keys_map_to_actions() {
        let bindings = KeyBindings::new(&KeybindingMode::Vim);
        assert_eq!(handle_input(press(KeyCode::Char('q')), &bindings), InputResult::Quit);
        assert_eq!(
            handle_input(press(KeyCode::End), &bindings),
            InputResult::Action(Action::Latest)
        );
        assert_eq!(handle_input(press(KeyCode::Char('z')), &bindings), InputResult::Continue);
    }

    #[test]
    fn test_key_release_ignored() {
        let bindings = KeyBindings::new(&KeybindingMode::Vim);
        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(handle_input(Event::Key(release), &bindings), InputResult::Continue);
    }

    #[test]
    fn test_wheel_and_focus() {
        let bindings = KeyBindings::new(&KeybindingMode::Arrows);
        let wheel = Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(handle_input(wheel, &bindings), InputResult::Scroll(-3));
        assert_eq!(handle_input(Event::FocusGained, &bindings), InputResult::FocusGained);
    }
}
