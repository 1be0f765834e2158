//! The event object passed through a dispatch.
//!
//! An [`Event`] carries an optional type, a bag of JSON payload fields, the
//! id of the target that fired it, and three flags:
//!
//! - default prevented
//! - propagation stopped
//! - immediate propagation stopped (which also stops propagation)
//!
//! Flags only ever go from unset to set. They live in a shared state cell so
//! that an event derived with `sync_state` can forward every flag it sets to
//! the event it was derived from.

mod delegate;
mod derive;

pub use delegate::{DelegateOptions, delegate, delegate_as};
pub use derive::FromEventOptions;

use crate::target::TargetId;
use compact_str::CompactString;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Field names that never travel with preserved event data.
///
/// `type` and `target` are owned by the event itself; the rest are the flag
/// accessors, which a payload must not be able to shadow.
pub const RESERVED_FIELDS: [&str; 8] = [
    "type",
    "target",
    "preventDefault",
    "isDefaultPrevented",
    "stopPropagation",
    "isPropagationStopped",
    "stopImmediatePropagation",
    "isImmediatePropagationStopped",
];

/// Field that receives a payload which is not an object.
pub const DATA_FIELD: &str = "data";

#[derive(Debug, Default)]
struct EventState {
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_propagation_stopped: Cell<bool>,
    /// State of the event this one was derived from with `sync_state`.
    upstream: Option<Rc<EventState>>,
}

impl EventState {
    fn synced_to(upstream: Rc<EventState>) -> Self {
        Self {
            upstream: Some(upstream),
            ..Self::default()
        }
    }

    fn prevent_default(&self) {
        if let Some(upstream) = &self.upstream {
            upstream.prevent_default();
        }
        self.default_prevented.set(true);
    }

    fn stop_propagation(&self) {
        if let Some(upstream) = &self.upstream {
            upstream.stop_propagation();
        }
        self.propagation_stopped.set(true);
    }

    fn stop_immediate_propagation(&self) {
        if let Some(upstream) = &self.upstream {
            upstream.stop_immediate_propagation();
        }
        self.immediate_propagation_stopped.set(true);
        self.stop_propagation();
    }
}

/// An event travelling from a target to its handlers.
#[derive(Debug, Default)]
pub struct Event {
    event_type: Option<CompactString>,
    target: Option<TargetId>,
    fields: Map<String, Value>,
    state: Rc<EventState>,
}

impl Event {
    /// An event of the given type with no payload.
    pub fn new(event_type: impl Into<CompactString>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            ..Self::default()
        }
    }

    /// An event built from a single payload.
    ///
    /// An object payload is copied field by field and its `type` field, when
    /// it is a string, becomes the event type. Any other payload is stored
    /// under [`DATA_FIELD`].
    pub fn from_payload(payload: Value) -> Self {
        let mut event = Self::default();
        event.absorb(payload, true);
        event
    }

    /// An event of an explicit type carrying `payload`.
    ///
    /// Like [`Event::from_payload`], except that the explicit type always
    /// wins over a `type` field inside the payload.
    pub fn with_payload(event_type: impl Into<CompactString>, payload: Value) -> Self {
        let mut event = Self::new(event_type);
        event.absorb(payload, false);
        event
    }

    fn absorb(&mut self, payload: Value, take_type: bool) {
        match payload {
            Value::Object(fields) => self.merge(fields, take_type),
            other if is_empty_payload(&other) => {}
            other => {
                self.fields.insert(DATA_FIELD.to_owned(), other);
            }
        }
    }

    /// Copy `fields` onto the event. A `type` field naming a type (see
    /// [`type_name`]) retypes the event when `take_type` is set. The field
    /// is dropped either way.
    fn merge(&mut self, fields: Map<String, Value>, take_type: bool) {
        for (key, value) in fields {
            if key == "type" {
                if let Some(event_type) = type_name(&value).filter(|_| take_type) {
                    self.event_type = Some(event_type);
                }
                continue;
            }
            self.fields.insert(key, value);
        }
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    pub fn set_type(&mut self, event_type: impl Into<CompactString>) {
        self.event_type = Some(event_type.into());
    }

    /// The target that fired this event, once it has been fired.
    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<TargetId>) {
        self.target = target;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// The non-object payload the event was built with, if any.
    pub fn data(&self) -> Option<&Value> {
        self.get(DATA_FIELD)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_default_prevented(&self) -> bool {
        self.state.default_prevented.get()
    }

    pub fn prevent_default(&mut self) {
        self.state.prevent_default();
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.state.propagation_stopped.get()
    }

    pub fn stop_propagation(&mut self) {
        self.state.stop_propagation();
    }

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.state.immediate_propagation_stopped.get()
    }

    /// Stop the remaining handlers of the running queue. Also stops
    /// propagation.
    pub fn stop_immediate_propagation(&mut self) {
        self.state.stop_immediate_propagation();
    }
}

/// `null`, `false`, zero and the empty string carry nothing.
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// The event type named by a payload's `type` field: a non-empty string, or
/// a non-zero number in its decimal form.
pub(crate) fn type_name(value: &Value) -> Option<CompactString> {
    match value {
        _ if is_empty_payload(value) => None,
        Value::String(text) => Some(CompactString::from(text.as_str())),
        Value::Number(number) => Some(CompactString::from(number.to_string())),
        _ => None,
    }
}

impl From<&str> for Event {
    fn from(event_type: &str) -> Self {
        Event::new(event_type)
    }
}

/// Serializes as one flat object: `type`, `target`, the payload fields, then
/// the three flag states.
impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.event_type)?;
        map.serialize_entry("target", &self.target)?;
        for (key, value) in self.fields.iter() {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("defaultPrevented", &self.is_default_prevented())?;
        map.serialize_entry("propagationStopped", &self.is_propagation_stopped())?;
        map.serialize_entry(
            "immediatePropagationStopped",
            &self.is_immediate_propagation_stopped(),
        )?;
        map.end()
    }
}
