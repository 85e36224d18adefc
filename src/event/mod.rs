mod bus;
mod events;

pub use bus::EventBus;
pub use events::{EventLog, MarkingEvent, StatusLine};

pub trait EventHandler {
    fn handle_event(&mut self, event: &MarkingEvent);
}
