mod bus;
mod events;
mod handlers;

pub use bus::EventBus;
pub use events::{HistoryEvent, RestoreDirection};
pub use handlers::{Availability, AvailabilityHandler};

/// Receives events emitted on an [`EventBus`]
pub trait EventHandler {
    fn handle_event(&mut self, event: &HistoryEvent);
}

impl<F: FnMut(&HistoryEvent)> EventHandler for F {
    fn handle_event(&mut self, event: &HistoryEvent) {
        self(event)
    }
}
