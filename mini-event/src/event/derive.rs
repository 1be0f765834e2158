//! Deriving a new event from an existing one.

use super::{Event, EventState, RESERVED_FIELDS};
use compact_str::CompactString;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::rc::Rc;

/// Options for [`Event::from_event`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FromEventOptions {
    /// Type of the new event. Defaults to the original's type.
    #[serde(rename = "type")]
    pub event_type: Option<CompactString>,
    /// Copy the original's payload fields.
    pub preserve_data: bool,
    /// Forward every flag set on the new event to the original first.
    pub sync_state: bool,
    /// Extra fields applied last, overriding preserved data.
    pub extend: Option<Map<String, Value>>,
}

impl FromEventOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, event_type: impl Into<CompactString>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn preserve_data(mut self) -> Self {
        self.preserve_data = true;
        self
    }

    pub fn sync_state(mut self) -> Self {
        self.sync_state = true;
        self
    }

    pub fn extend(mut self, fields: Map<String, Value>) -> Self {
        self.extend = Some(fields);
        self
    }
}

impl Event {
    /// Build a new event from `original`.
    ///
    /// The new event starts with unset flags and no target. With
    /// `preserve_data` the original's fields are copied, skipping
    /// [`RESERVED_FIELDS`]. `extend` is applied afterwards and may retype
    /// the event through its own `type` field. With `sync_state`, setting a
    /// flag on the new event sets the same flag on the original (and on
    /// whatever the original is itself synced to) before setting its own.
    pub fn from_event(original: &Event, options: FromEventOptions) -> Event {
        let mut event = Event {
            event_type: options
                .event_type
                .or_else(|| original.event_type.clone()),
            ..Event::default()
        };

        if options.preserve_data {
            for (key, value) in &original.fields {
                if !RESERVED_FIELDS.contains(&key.as_str()) {
                    event.fields.insert(key.clone(), value.clone());
                }
            }
        }

        if let Some(extend) = options.extend {
            event.merge(extend, true);
        }

        if options.sync_state {
            event.state = Rc::new(EventState::synced_to(Rc::clone(&original.state)));
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_keeps_type_but_not_data_by_default() {
        let event = Event::with_payload("foo", json!({"x": 1}));
        let derived = Event::from_event(&event, FromEventOptions::new());
        assert_eq!(derived.event_type(), Some("foo"));
        assert_eq!(derived.get("x"), None);
    }

    #[test]
    fn test_type_override() {
        let event = Event::new("foo");
        let derived = Event::from_event(&event, FromEventOptions::new().with_type("bar"));
        assert_eq!(derived.event_type(), Some("bar"));
    }

    #[test]
    fn test_preserve_data_copies_fields() {
        let event = Event::with_payload("foo", json!({"x": 1}));
        let derived = Event::from_event(&event, FromEventOptions::new().preserve_data());
        assert_eq!(derived.event_type(), Some("foo"));
        assert_eq!(derived.get("x"), Some(&json!(1)));
    }

    #[test]
    fn test_preserve_data_skips_reserved_fields() {
        let mut event = Event::with_payload("foo", json!({"x": 1}));
        event.set_target(Some(crate::target::TargetId::new()));
        event.insert("target", json!("spoofed"));
        event.insert("stopPropagation", json!(true));
        event.stop_propagation();

        let derived = Event::from_event(&event, FromEventOptions::new().preserve_data());
        assert_eq!(derived.target(), None);
        assert_eq!(derived.get("target"), None);
        assert_eq!(derived.get("stopPropagation"), None);
        assert!(!derived.is_propagation_stopped());
        assert_eq!(derived.fields().len(), 1);
    }

    #[test]
    fn test_extend_wins_over_preserved_data() {
        let event = Event::with_payload("foo", json!({"x": 1, "y": 2}));
        let derived = Event::from_event(
            &event,
            FromEventOptions::new()
                .preserve_data()
                .extend(object(json!({"x": 10, "type": "baz"}))),
        );
        assert_eq!(derived.get("x"), Some(&json!(10)));
        assert_eq!(derived.get("y"), Some(&json!(2)));
        assert_eq!(derived.event_type(), Some("baz"));
    }

    #[test]
    fn test_sync_state_forwards_every_flag() {
        let event = Event::with_payload("foo", json!({"x": 1}));
        let mut derived = Event::from_event(&event, FromEventOptions::new().sync_state());
        derived.stop_propagation();
        derived.prevent_default();
        derived.stop_immediate_propagation();

        assert!(event.is_propagation_stopped());
        assert!(event.is_default_prevented());
        assert!(event.is_immediate_propagation_stopped());
        assert!(derived.is_immediate_propagation_stopped());
    }

    #[test]
    fn test_sync_state_immediate_stop_cascades_without_prevent_default() {
        let event = Event::new("foo");
        let mut derived = Event::from_event(&event, FromEventOptions::new().sync_state());
        derived.stop_immediate_propagation();

        assert!(event.is_immediate_propagation_stopped());
        assert!(event.is_propagation_stopped());
        assert!(!event.is_default_prevented());
    }

    #[test]
    fn test_sync_state_is_one_way() {
        let mut event = Event::new("foo");
        let derived = Event::from_event(&event, FromEventOptions::new().sync_state());
        event.stop_propagation();
        assert!(!derived.is_propagation_stopped());
    }

    #[test]
    fn test_sync_state_chains_through_derivations() {
        let root = Event::new("foo");
        let middle = Event::from_event(&root, FromEventOptions::new().sync_state());
        let mut leaf = Event::from_event(&middle, FromEventOptions::new().sync_state());
        leaf.prevent_default();
        assert!(middle.is_default_prevented());
        assert!(root.is_default_prevented());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: FromEventOptions =
            serde_json::from_value(json!({"type": "bar", "sync_state": true})).unwrap();
        assert_eq!(options.event_type.as_deref(), Some("bar"));
        assert!(options.sync_state);
        assert!(!options.preserve_data);
        assert_eq!(options.extend, None);
    }
}
