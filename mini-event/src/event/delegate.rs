//! Relaying events from one object to another.

use super::{Event, FromEventOptions};
use crate::queue::{Handler, ListenOptions};
use crate::target::{Fire, Listen, Payload, WILDCARD};
use compact_str::CompactString;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::{trace, warn};

/// Options for [`delegate`] and [`delegate_as`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DelegateOptions {
    /// Copy the source event's payload fields onto the relayed event.
    pub preserve_data: bool,
    /// Forward flags set on the relayed event back to the source event.
    pub sync_state: bool,
    /// Extra fields applied to every relayed event.
    pub extend: Option<Map<String, Value>>,
}

impl DelegateOptions {
    pub fn new() -> Self {
        Self::default()
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

    fn derive_options(&self) -> FromEventOptions {
        FromEventOptions {
            event_type: None,
            preserve_data: self.preserve_data,
            sync_state: self.sync_state,
            extend: self.extend.clone(),
        }
    }
}

/// Re-fire every `event_type` event of `from` on `to` under the same type.
///
/// Returns the relay handler registered on `from`, which can be passed to
/// `un` to stop relaying.
pub fn delegate<S, T>(from: &S, to: &Rc<T>, event_type: &str, options: DelegateOptions) -> Handler
where
    S: Listen,
    T: Fire + 'static,
{
    delegate_as(from, event_type, to, event_type, options)
}

/// Re-fire every `from_type` event of `from` on `to` as `to_type`.
///
/// The relayed event is derived from the source event with
/// [`Event::from_event`], then retyped and retargeted to `to`. The relay
/// only holds a weak reference to `to` and does nothing once it is gone.
///
/// A `to_type` that can never be fired (empty, or [`WILDCARD`]) installs
/// nothing: the returned handler is not registered on `from`.
pub fn delegate_as<S, T>(
    from: &S,
    from_type: &str,
    to: &Rc<T>,
    to_type: &str,
    options: DelegateOptions,
) -> Handler
where
    S: Listen,
    T: Fire + 'static,
{
    if to_type.is_empty() || to_type == WILDCARD {
        warn!(event_type = to_type, "refusing to relay to an event type that cannot be fired");
        return Handler::new(|_, _| {});
    }

    let destination = Rc::downgrade(to);
    let to_type = CompactString::from(to_type);

    let relay = Handler::new(move |original, _| {
        let Some(destination) = destination.upgrade() else {
            trace!(event_type = %to_type, "relay destination dropped");
            return;
        };

        let mut event = Event::from_event(original, options.derive_options());
        event.set_type(to_type.clone());
        event.set_target(Some(destination.target_id()));

        if let Err(error) = destination.fire(&to_type, Payload::Event(event)) {
            warn!(event_type = %to_type, %error, "failed to relay event");
        }
    });

    from.on(from_type, relay.clone(), ListenOptions::new());
    relay
}
