use egui::{InputState, Key, Modifiers};

/// History shortcuts. Ctrl on Windows and Linux, Cmd on macOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
}

impl Shortcut {
    pub const ALL: [Shortcut; 2] = [Shortcut::Undo, Shortcut::Redo];

    pub fn key(self) -> Key {
        match self {
            Shortcut::Undo => Key::Z,
            Shortcut::Redo => Key::Y,
        }
    }

    /// Removes the first pressed shortcut from `input` so it does not reach other widgets.
    pub fn consume(input: &mut InputState) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|shortcut| input.consume_key(Modifiers::COMMAND, shortcut.key()))
    }
}
