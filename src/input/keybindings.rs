use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::config::KeybindingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Navigation
    Up,
    Down,
    PageUp,
    PageDown,
    /// Jump to the oldest message of the open conversation
    Oldest,
    /// Re-open the conversation at its newest message
    Latest,

    // Actions
    SwitchFocus,
    Open,
    Back,
    Refresh,
    Quit,
}

pub struct KeyBindings {
    bindings: HashMap<KeyEvent, Action>,
}

impl KeyBindings {
    pub fn new(mode: &KeybindingMode) -> Self {
        let mut bindings = Self::common_bindings();
        match mode {
            KeybindingMode::Vim => bindings.extend(Self::vim_bindings()),
            KeybindingMode::Arrows => bindings.extend(Self::arrow_bindings()),
        }
        Self { bindings }
    }

    pub fn get(&self, event: &KeyEvent) -> Option<Action> {
        self.bindings.get(event).copied()
    }

    /// Keys that behave the same in every mode
    fn common_bindings() -> HashMap<KeyEvent, Action> {
        let mut map = HashMap::new();

        map.insert(key_code(KeyCode::Up), Action::Up);
        map.insert(key_code(KeyCode::Down), Action::Down);
        map.insert(key_code(KeyCode::PageUp), Action::PageUp);
        map.insert(key_code(KeyCode::PageDown), Action::PageDown);
        map.insert(key_code(KeyCode::Home), Action::Oldest);
        map.insert(key_code(KeyCode::End), Action::Latest);
        map.insert(key_code(KeyCode::Tab), Action::SwitchFocus);
        map.insert(shift_key_code(KeyCode::BackTab), Action::SwitchFocus);
        map.insert(key_code(KeyCode::Enter), Action::Open);
        map.insert(key_code(KeyCode::Esc), Action::Back);
        map.insert(ctrl_key('c'), Action::Quit);

        map
    }

    fn vim_bindings() -> HashMap<KeyEvent, Action> {
        let mut map = HashMap::new();

        map.insert(key('j'), Action::Down);
        map.insert(key('k'), Action::Up);
        map.insert(ctrl_key('d'), Action::PageDown);
        map.insert(ctrl_key('u'), Action::PageUp);
        map.insert(key('g'), Action::Oldest);
        map.insert(shift_key('G'), Action::Latest);
        map.insert(key('l'), Action::Open);
        map.insert(key('h'), Action::Back);
        map.insert(key('r'), Action::Refresh);
        map.insert(key('q'), Action::Quit);

        map
    }

    fn arrow_bindings() -> HashMap<KeyEvent, Action> {
        let mut map = HashMap::new();

        map.insert(key_code(KeyCode::Right), Action::Open);
        map.insert(key_code(KeyCode::Left), Action::Back);
        map.insert(key_code(KeyCode::F(5)), Action::Refresh);
        map.insert(ctrl_key('r'), Action::Refresh);
        map.insert(ctrl_key('q'), Action::Quit);

        map
    }
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn shift_key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::SHIFT)
}

fn ctrl_key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn key_code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn shift_key_code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::SHIFT)
}
