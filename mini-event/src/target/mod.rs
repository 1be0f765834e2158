//! Event targets: per-object registries of named event queues.
//!
//! Each [`EventTarget`] lazily creates its registry on the first
//! registration. Firing an event runs, in order:
//!
//! 1. the inline handler set for the exact type, if any
//! 2. the queue registered for the exact type
//! 3. the wildcard (`*`) queue
//!
//! Handlers may tear the registry down mid-dispatch with
//! [`EventTarget::destroy_events`]; the remaining phases are then skipped.

mod capability;

pub use capability::{Evented, Fire, Listen, Observable};

use crate::error::EventError;
use crate::event::{Event, type_name};
use crate::queue::{Context, EventQueue, Handler, ListenOptions};
use compact_str::CompactString;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Event name whose handlers run on every fire. It can be listened on but
/// never fired.
pub const WILDCARD: &str = "*";

/// Identity of an event target, stamped on every event it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TargetId(Uuid);

impl TargetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// What a fire carries besides its type.
#[derive(Debug, Default)]
pub enum Payload {
    /// No payload: a bare event of the fired type.
    #[default]
    None,
    /// A pre-built event, dispatched as-is apart from its target.
    Event(Event),
    /// Payload fields (object) or a single `data` value (anything else).
    Value(Value),
}

impl Payload {
    /// The type a single-argument fire resolves to.
    fn event_type(&self) -> Option<CompactString> {
        match self {
            Payload::None => None,
            Payload::Event(event) => event.event_type().map(CompactString::from),
            Payload::Value(Value::Object(fields)) => fields.get("type").and_then(type_name),
            Payload::Value(_) => None,
        }
    }

    fn into_event(self, event_type: &str) -> Event {
        match self {
            Payload::None => Event::new(event_type),
            Payload::Event(event) => event,
            Payload::Value(value) => Event::with_payload(event_type, value),
        }
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Payload::None
    }
}

impl From<Event> for Payload {
    fn from(event: Event) -> Self {
        Payload::Event(event)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Value(value)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(fields: Map<String, Value>) -> Self {
        Payload::Value(Value::Object(fields))
    }
}

#[derive(Debug, Default)]
struct Registry {
    queues: HashMap<CompactString, Rc<EventQueue>>,
    inline: HashMap<CompactString, Handler>,
}

/// A registry of named event handlers.
///
/// All methods take `&self`, so handlers can hold a reference (usually a
/// `Weak`) to the target and register, remove, fire or destroy while a
/// dispatch is running.
#[derive(Debug, Default)]
pub struct EventTarget {
    id: TargetId,
    registry: RefCell<Option<Registry>>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant event capability to a value that cannot embed a target.
    pub fn enable<T>(value: T) -> Evented<T> {
        Evented::new(value)
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Register `handler` for `event_type` (or [`WILDCARD`]).
    ///
    /// Registering the same handler with the same binding twice is a no-op.
    pub fn on(&self, event_type: &str, handler: Handler, options: ListenOptions) {
        let queue = {
            let mut registry = self.registry.borrow_mut();
            let registry = registry.get_or_insert_with(|| {
                debug!(target_id = %self.id, "event registry created");
                Registry::default()
            });
            Rc::clone(
                registry
                    .queues
                    .entry(CompactString::from(event_type))
                    .or_insert_with(|| {
                        debug!(target_id = %self.id, event_type, "event queue created");
                        Rc::new(EventQueue::new())
                    }),
            )
        };
        queue.add(handler, options);
    }

    /// Register a handler that removes itself after its first run.
    pub fn once(&self, event_type: &str, handler: Handler, options: ListenOptions) {
        self.on(event_type, handler, options.once());
    }

    /// Remove `handler` bound to `this` from `event_type`, or every handler
    /// of `event_type` when `handler` is `None`.
    ///
    /// [`WILDCARD`] only addresses handlers registered on the wildcard.
    pub fn un(&self, event_type: &str, handler: Option<&Handler>, this: Option<&Context>) {
        if let Some(queue) = self.queue(event_type) {
            queue.remove(handler, this);
        }
    }

    /// Fire `event_type` with `payload` and return the dispatched event.
    pub fn fire(&self, event_type: &str, payload: impl Into<Payload>) -> Result<Event, EventError> {
        if event_type.is_empty() {
            return Err(EventError::MissingType);
        }
        if event_type == WILDCARD {
            return Err(EventError::GlobalFire);
        }

        let mut event = payload.into().into_event(event_type);
        event.set_target(Some(self.id));
        let this = Context::Target(self.id);
        trace!(target_id = %self.id, event_type, "firing event");

        if let Some(inline) = self.inline_handler(event_type) {
            if !event.is_immediate_propagation_stopped() {
                inline.invoke(&mut event, &this);
            }
        }

        if let Some(queue) = self.queue(event_type) {
            queue.execute(&mut event, &this);
        }

        // Looked up again: a handler above may have destroyed the registry.
        if let Some(queue) = self.queue(WILDCARD) {
            queue.execute(&mut event, &this);
        }

        Ok(event)
    }

    /// Fire an event whose type comes from the payload itself: the type of
    /// a pre-built [`Event`], or the `type` field of an object payload.
    pub fn fire_with(&self, payload: impl Into<Payload>) -> Result<Event, EventError> {
        let payload = payload.into();
        let event_type = payload.event_type().ok_or(EventError::MissingType)?;
        self.fire(&event_type, payload)
    }

    /// Dispose every queue and drop the registry. Later registrations
    /// start a fresh one.
    pub fn destroy_events(&self) {
        let Some(registry) = self.registry.borrow_mut().take() else {
            return;
        };
        for queue in registry.queues.values() {
            queue.dispose();
        }
        debug!(
            target_id = %self.id,
            queues = registry.queues.len(),
            "event registry destroyed"
        );
    }

    /// Set the handler that runs before the queue of `event_type`,
    /// replacing any previous one. Ignored for [`WILDCARD`].
    pub fn set_inline_handler(&self, event_type: &str, handler: Handler) {
        if event_type == WILDCARD {
            debug!(target_id = %self.id, "ignoring inline handler for the wildcard");
            return;
        }
        self.registry
            .borrow_mut()
            .get_or_insert_with(Registry::default)
            .inline
            .insert(CompactString::from(event_type), handler);
    }

    pub fn take_inline_handler(&self, event_type: &str) -> Option<Handler> {
        self.registry
            .borrow_mut()
            .as_mut()
            .and_then(|registry| registry.inline.remove(event_type))
    }

    /// Number of live handlers registered for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.queue(event_type).map_or(0, |queue| queue.length())
    }

    pub fn has_listeners(&self, event_type: &str) -> bool {
        self.listener_count(event_type) > 0
    }

    fn queue(&self, event_type: &str) -> Option<Rc<EventQueue>> {
        self.registry
            .borrow()
            .as_ref()
            .and_then(|registry| registry.queues.get(event_type))
            .map(Rc::clone)
    }

    fn inline_handler(&self, event_type: &str) -> Option<Handler> {
        self.registry
            .borrow()
            .as_ref()
            .and_then(|registry| registry.inline.get(event_type))
            .cloned()
    }
}
