//! Synchronous event targets for single-threaded object graphs.
//!
//! The crate is built from three cooperating pieces:
//!
//! - [`EventQueue`]: ordered handler storage for one event name, safe to
//!   mutate while it is being executed.
//! - [`Event`]: the envelope passed to handlers, carrying a type, payload
//!   fields and the default-prevented / propagation-stopped flags.
//! - [`EventTarget`]: a registry of named queues plus the `*` wildcard
//!   channel, with `on` / `once` / `un` / `fire` / `destroy_events`.
//!
//! ```
//! use mini_event::{EventTarget, Handler, ListenOptions};
//! use serde_json::Value;
//!
//! let target = EventTarget::new();
//! target.on(
//!     "change",
//!     Handler::new(|event, _| {
//!         event.insert("seen", Value::Bool(true));
//!     }),
//!     ListenOptions::new(),
//! );
//!
//! let event = target.fire("change", ()).unwrap();
//! assert_eq!(event.get("seen"), Some(&Value::Bool(true)));
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod queue;
pub mod target;

pub use error::EventError;
pub use event::{DelegateOptions, Event, FromEventOptions, delegate, delegate_as};
pub use queue::{Context, EventQueue, Handler, ListenOptions};
pub use target::{EventTarget, Evented, Fire, Listen, Observable, Payload, TargetId, WILDCARD};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Derive a new event from `original`. See [`Event::from_event`].
pub fn from_event(original: &Event, options: FromEventOptions) -> Event {
    Event::from_event(original, options)
}
