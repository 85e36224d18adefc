use egui::{Context, InputState, Key, PointerButton, Pos2, Rect};

mod rotate;
mod shortcuts;

pub use rotate::ManualRotation;
pub use shortcuts::Shortcut;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
}

/// A pointer event on one canvas.
///
/// `position` is normalized: relative to the top-left corner of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: Pos2,
    /// Button pressed or released. Moves carry none.
    pub button: Option<PointerButton>,
}

impl PointerEvent {
    pub fn down(position: Pos2, button: PointerButton) -> Self {
        Self {
            kind: PointerEventKind::Down,
            position,
            button: Some(button),
        }
    }

    pub fn moved(position: Pos2) -> Self {
        Self {
            kind: PointerEventKind::Move,
            position,
            button: None,
        }
    }

    pub fn up(position: Pos2, button: PointerButton) -> Self {
        Self {
            kind: PointerEventKind::Up,
            position,
            button: Some(button),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.button == Some(PointerButton::Primary)
    }
}

/// Keys that suspend marking while held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    /// Space: drag pans the canvas.
    pub pan_key_held: bool,
    /// R: drag rotates the canvas.
    pub rotate_key_held: bool,
}

impl KeyState {
    pub fn from_input(input: &InputState) -> Self {
        Self {
            pan_key_held: input.key_down(Key::Space),
            rotate_key_held: input.key_down(Key::R),
        }
    }

    pub fn blocks_marking(&self) -> bool {
        self.pan_key_held || self.rotate_key_held
    }
}

/// Turns raw egui pointer input over one canvas into [`PointerEvent`]s.
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
}

impl InputHandler {
    /// Collects the pointer events that happened inside `rect` this frame.
    pub fn process_input(&mut self, ctx: &Context, rect: Rect) -> Vec<PointerEvent> {
        let mut events = Vec::new();

        ctx.input(|input| {
            let hover = input.pointer.hover_pos().filter(|pos| rect.contains(*pos));
            let Some(pos) = hover else {
                self.last_pointer_pos = None;
                return;
            };
            let local = (pos - rect.min).to_pos2();

            if Some(pos) != self.last_pointer_pos {
                events.push(PointerEvent::moved(local));
            }
            self.last_pointer_pos = Some(pos);

            for button in [PointerButton::Primary, PointerButton::Secondary, PointerButton::Middle] {
                if input.pointer.button_pressed(button) {
                    events.push(PointerEvent::down(local, button));
                }
                if input.pointer.button_released(button) {
                    events.push(PointerEvent::up(local, button));
                }
            }
        });

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_only_primary_counts() {
        assert!(PointerEvent::down(pos2(1.0, 1.0), PointerButton::Primary).is_primary());
        assert!(!PointerEvent::down(pos2(1.0, 1.0), PointerButton::Secondary).is_primary());
        assert!(!PointerEvent::moved(pos2(1.0, 1.0)).is_primary());
    }

    #[test]
    fn test_held_keys_block_marking() {
        assert!(!KeyState::default().blocks_marking());
        let panning = KeyState {
            pan_key_held: true,
            ..KeyState::default()
        };
        assert!(panning.blocks_marking());
        let rotating = KeyState {
            rotate_key_held: true,
            ..KeyState::default()
        };
        assert!(rotating.blocks_marking());
    }
}
