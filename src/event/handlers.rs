use std::cell::Cell;
use std::rc::Rc;
use crate::event::{EventHandler, HistoryEvent};

/// Undo/redo enablement as last reported by the history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Availability {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Keeps an [`Availability`] in sync with history events so the toolbar
/// can enable its buttons without borrowing the history.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityHandler {
    state: Rc<Cell<Availability>>,
}

impl AvailabilityHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Availability {
        self.state.get()
    }
}

impl EventHandler for AvailabilityHandler {
    fn handle_event(&mut self, event: &HistoryEvent) {
        if let HistoryEvent::Changed { can_undo, can_redo, .. } = event {
            self.state.set(Availability {
                can_undo: *can_undo,
                can_redo: *can_redo,
            });
        }
    }
}
