use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::event::EventHandler;
use crate::marking::MarkingClass;
use crate::state::CanvasId;

#[derive(Debug, Clone, PartialEq)]
pub enum MarkingEvent {
    CaptureStarted {
        canvas: CanvasId,
        class: MarkingClass,
        label: u32,
    },
    MarkingCommitted {
        canvas: CanvasId,
        label: u32,
    },
    CaptureInterrupted {
        canvas: CanvasId,
    },
    MarkingRemoved {
        canvas: CanvasId,
        label: u32,
    },
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
    },
    RotationChanged {
        canvas: CanvasId,
        rotation: f32,
    },
    CollectionReset {
        canvas: CanvasId,
    },
}

impl fmt::Display for MarkingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkingEvent::CaptureStarted { canvas, class, label } => {
                write!(f, "Placing {} {} on the {} image", class, label, canvas)
            }
            MarkingEvent::MarkingCommitted { canvas, label } => write!(f, "Marking {} added to the {} image", label, canvas),
            MarkingEvent::CaptureInterrupted { canvas } => write!(f, "Marking on the {} image cancelled", canvas),
            MarkingEvent::MarkingRemoved { canvas, label } => write!(f, "Marking {} removed from the {} image", label, canvas),
            MarkingEvent::HistoryChanged { can_undo, can_redo } => {
                write!(f, "History changed (undo: {}, redo: {})", can_undo, can_redo)
            }
            MarkingEvent::RotationChanged { canvas, rotation } => {
                write!(f, "{} image rotated to {:.1}°", canvas, rotation.to_degrees())
            }
            MarkingEvent::CollectionReset { canvas } => write!(f, "Markings on the {} image cleared", canvas),
        }
    }
}

/// Records every event it receives. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<MarkingEvent>>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<MarkingEvent> {
        self.events.borrow().clone()
    }

    pub fn last(&self) -> Option<MarkingEvent> {
        self.events.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventHandler for EventLog {
    fn handle_event(&mut self, event: &MarkingEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Keeps a one-line description of the latest user-facing event. Clones share the line.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    message: Rc<RefCell<Option<String>>>,
}

impl StatusLine {
    pub fn message(&self) -> Option<String> {
        self.message.borrow().clone()
    }
}

impl EventHandler for StatusLine {
    fn handle_event(&mut self, event: &MarkingEvent) {
        // Follows every commit, undo and redo; the toolbar already shows it.
        if matches!(event, MarkingEvent::HistoryChanged { .. }) {
            return;
        }
        *self.message.borrow_mut() = Some(event.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_keeps_latest_message() {
        let status = StatusLine::default();
        let mut handler = status.clone();
        assert_eq!(status.message(), None);

        handler.handle_event(&MarkingEvent::MarkingCommitted {
            canvas: CanvasId::Left,
            label: 3,
        });
        handler.handle_event(&MarkingEvent::HistoryChanged {
            can_undo: true,
            can_redo: false,
        });
        assert_eq!(status.message().as_deref(), Some("Marking 3 added to the left image"));
    }
}
