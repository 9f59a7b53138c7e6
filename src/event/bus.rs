use std::cell::RefCell;
use crate::event::{EventHandler, HistoryEvent};

/// A simple event bus for broadcasting history events to registered handlers
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

    /// Subscribe a handler to receive events
    pub fn subscribe(&self, handler: impl EventHandler + 'static) {
        self.handlers.borrow_mut().push(Box::new(handler));
    }

    /// Emit an event to all registered handlers.
    ///
    /// Handlers must not subscribe from inside `handle_event`.
    pub fn emit(&self, event: HistoryEvent) {
        for handler in &mut *self.handlers.borrow_mut() {
            handler.handle_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_every_handler() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(move |event: &HistoryEvent| {
                if let HistoryEvent::Changed { undo_depth, .. } = event {
                    seen.borrow_mut().push((tag, *undo_depth));
                }
            });
        }

        bus.emit(HistoryEvent::Changed {
            can_undo: true,
            can_redo: false,
            undo_depth: 3,
            redo_depth: 0,
        });

        assert_eq!(*seen.borrow(), vec![("first", 3), ("second", 3)]);
    }
}
