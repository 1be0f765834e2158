//! Ordered handler storage for a single event channel.
//!
//! Removal leaves an empty slot behind instead of shifting later entries,
//! so an [`EventQueue::execute`] pass that is in progress keeps its
//! position. Clearing or disposing the queue truncates the storage the
//! running pass reads from, which ends that pass after the current handler.

mod handler;

pub use handler::{Context, Handler, ListenOptions};

use crate::event::Event;
use handler::Registration;
use std::cell::RefCell;
use tracing::{trace, warn};

/// Ordered, re-entrancy safe list of handlers for one event name.
#[derive(Debug)]
pub struct EventQueue {
    /// `None` once the queue has been disposed.
    slots: RefCell<Option<Vec<Option<Registration>>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Some(Vec::new())),
        }
    }

    /// Append a handler.
    ///
    /// Adding a handler that is already registered with the same binding is
    /// a no-op. The same handler with a different binding is a separate
    /// registration.
    pub fn add(&self, handler: Handler, options: ListenOptions) {
        let mut slots = self.slots.borrow_mut();
        let Some(slots) = slots.as_mut() else {
            warn!("ignoring handler added to a disposed event queue");
            return;
        };

        let duplicate = slots
            .iter()
            .flatten()
            .any(|registration| registration.is_identical(&handler, options.this.as_ref()));
        if duplicate {
            return;
        }

        slots.push(Some(Registration::new(handler, options)));
    }

    /// Remove one handler, or every handler when `handler` is `None`.
    ///
    /// A registration made with a binding is only removed when the same
    /// binding is passed here, and one made without a binding only when
    /// `this` is `None`.
    pub fn remove(&self, handler: Option<&Handler>, this: Option<&Context>) {
        let Some(handler) = handler else {
            self.clear();
            return;
        };

        let mut slots = self.slots.borrow_mut();
        let Some(slots) = slots.as_mut() else {
            return;
        };

        let found = slots.iter_mut().find(|slot| {
            matches!(slot, Some(registration) if registration.is_identical(handler, this))
        });
        // Duplicates are rejected on add, so the first match is the only one.
        if let Some(slot) = found {
            *slot = None;
        }
    }

    /// Drop every registration, including removed slots.
    pub fn clear(&self) {
        if let Some(slots) = self.slots.borrow_mut().as_mut() {
            slots.clear();
        }
    }

    /// Run every live handler in registration order.
    ///
    /// Handlers without their own binding run against `this`. The pass
    /// stops as soon as the event's immediate propagation is stopped, or
    /// once the queue is cleared or disposed by one of its handlers.
    /// Handlers added during the pass run in the same pass.
    pub fn execute(&self, event: &mut Event, this: &Context) {
        let mut index = 0;
        loop {
            if event.is_immediate_propagation_stopped() {
                trace!(skipped_from = index, "immediate propagation stopped");
                return;
            }

            // The borrow must end before the handler runs, since handlers
            // may add to or remove from this very queue.
            let slot = match self.slots.borrow().as_ref().and_then(|slots| slots.get(index)) {
                Some(slot) => slot.clone(),
                None => return,
            };
            index += 1;

            let Some(registration) = slot else {
                continue;
            };

            registration
                .handler
                .invoke(event, registration.this.as_ref().unwrap_or(this));

            if registration.once {
                trace!(handler = ?registration.handler, "removing once handler");
                self.remove(Some(&registration.handler), registration.this.as_ref());
            }
        }
    }

    /// Number of live registrations.
    pub fn length(&self) -> usize {
        self.slots
            .borrow()
            .as_ref()
            .map_or(0, |slots| slots.iter().flatten().count())
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Release the storage.
    ///
    /// Safe to call from a handler of this queue: no handler after the
    /// disposing one runs. Handlers added afterwards are ignored.
    pub fn dispose(&self) {
        self.clear();
        self.slots.replace(None);
    }

    pub fn is_disposed(&self) -> bool {
        self.slots.borrow().is_none()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
