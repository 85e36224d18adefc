use std::cell::RefCell;

use crate::event::{EventHandler, MarkingEvent};

/// Broadcasts marking events to registered handlers.
pub struct EventBus {
    handlers: RefCell<Vec<Box<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.handlers.borrow_mut().push(handler);
    }

    /// Delivers `event` to every handler in subscription order.
    ///
    /// Handlers must not emit on the same bus.
    pub fn emit(&self, event: MarkingEvent) {
        log::trace!("Emitting {:?}", event);
        for handler in &mut *self.handlers.borrow_mut() {
            handler.handle_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventLog;
    use crate::state::CanvasId;

    #[test]
    fn test_every_handler_sees_event() {
        let bus = EventBus::new();
        let first = EventLog::default();
        let second = EventLog::default();
        bus.subscribe(Box::new(first.clone()));
        bus.subscribe(Box::new(second.clone()));

        bus.emit(MarkingEvent::CollectionReset { canvas: CanvasId::Left });

        assert_eq!(first.events(), vec![MarkingEvent::CollectionReset { canvas: CanvasId::Left }]);
        assert_eq!(second.len(), 1);
    }
}
