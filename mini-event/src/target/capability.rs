//! Capability traits for objects that take part in event wiring.
//!
//! [`Listen`] and [`Fire`] are the minimal shapes [`delegate`] needs from
//! its source and destination. Any type can implement them directly.
//! Types that embed an [`EventTarget`] implement [`Observable`] instead and
//! get both, plus the rest of the target API.
//!
//! [`delegate`]: crate::event::delegate

use super::{EventTarget, Payload, TargetId};
use crate::error::EventError;
use crate::event::Event;
use crate::queue::{Context, Handler, ListenOptions};
use std::ops::{Deref, DerefMut};

/// Something handlers can be registered on.
pub trait Listen {
    fn on(&self, event_type: &str, handler: Handler, options: ListenOptions);
}

/// Something events can be fired on.
pub trait Fire: Listen {
    /// Identity stamped on the events this object fires.
    fn target_id(&self) -> TargetId;

    fn fire(&self, event_type: &str, payload: impl Into<Payload>) -> Result<Event, EventError>;
}

/// A type that owns an [`EventTarget`] and exposes its API.
///
/// ```
/// use mini_event::{EventTarget, Fire, Handler, Listen, ListenOptions, Observable};
///
/// #[derive(Default)]
/// struct Model {
///     events: EventTarget,
/// }
///
/// impl Observable for Model {
///     fn events(&self) -> &EventTarget {
///         &self.events
///     }
/// }
///
/// let model = Model::default();
/// model.on("change", Handler::new(|_, _| {}), ListenOptions::new());
/// assert!(model.fire("change", ()).is_ok());
/// ```
pub trait Observable {
    fn events(&self) -> &EventTarget;

    fn once(&self, event_type: &str, handler: Handler, options: ListenOptions) {
        self.events().once(event_type, handler, options);
    }

    fn un(&self, event_type: &str, handler: Option<&Handler>, this: Option<&Context>) {
        self.events().un(event_type, handler, this);
    }

    fn fire_with(&self, payload: impl Into<Payload>) -> Result<Event, EventError>
    where
        Self: Sized,
    {
        self.events().fire_with(payload)
    }

    fn destroy_events(&self) {
        self.events().destroy_events();
    }
}

impl Observable for EventTarget {
    fn events(&self) -> &EventTarget {
        self
    }
}

impl<T: Observable> Listen for T {
    fn on(&self, event_type: &str, handler: Handler, options: ListenOptions) {
        self.events().on(event_type, handler, options);
    }
}

impl<T: Observable> Fire for T {
    fn target_id(&self) -> TargetId {
        self.events().id()
    }

    fn fire(&self, event_type: &str, payload: impl Into<Payload>) -> Result<Event, EventError> {
        self.events().fire(event_type, payload)
    }
}

/// A value retrofitted with its own event registry.
///
/// Built by [`EventTarget::enable`]. Derefs to the wrapped value.
#[derive(Debug, Default)]
pub struct Evented<T> {
    inner: T,
    events: EventTarget,
}

impl<T> Evented<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            events: EventTarget::new(),
        }
    }

    /// Unwrap the value, dropping its registry.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Observable for Evented<T> {
    fn events(&self) -> &EventTarget {
        &self.events
    }
}

impl<T> Deref for Evented<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for Evented<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DelegateOptions, delegate};
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Settings {
        theme: String,
    }

    #[test]
    fn test_enable_grants_event_capability() {
        let mut settings = EventTarget::enable(Settings::default());
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        settings.on(
            "change",
            Handler::new(move |_, _| counter.set(counter.get() + 1)),
            ListenOptions::new(),
        );
        settings.once("change", Handler::Cancel, ListenOptions::new());

        settings.theme = "dark".to_owned();
        let event = settings.fire("change", json!({"theme": "dark"})).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(event.target(), Some(settings.target_id()));
        assert!(event.is_default_prevented());

        let event = settings.fire_with(json!({"type": "change"})).unwrap();
        assert!(!event.is_default_prevented());
        assert_eq!(calls.get(), 2);

        settings.destroy_events();
        settings.fire("change", ()).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(settings.into_inner().theme, "dark");
    }

    #[test]
    fn test_enabled_values_have_independent_registries() {
        let a = EventTarget::enable(1_u8);
        let b = EventTarget::enable(2_u8);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let handler = Handler::new(move |_, _| counter.set(counter.get() + 1));
        a.on("change", handler.clone(), ListenOptions::new());
        b.fire("change", ()).unwrap();
        assert_eq!(calls.get(), 0);

        a.un("change", Some(&handler), None);
        a.fire("change", ()).unwrap();
        assert_eq!(calls.get(), 0);
        assert_ne!(a.target_id(), b.target_id());
        assert_eq!(*a + *b, 3);
    }

    #[test]
    fn test_evented_values_relay() {
        let source = EventTarget::enable("source");
        let target = Rc::new(EventTarget::enable("target"));
        let seen = Rc::new(Cell::new(false));
        let flag = Rc::clone(&seen);
        target.on(
            "bar",
            Handler::new(move |event, _| flag.set(event.get("x") == Some(&json!(1)))),
            ListenOptions::new(),
        );

        delegate(&source, &target, "bar", DelegateOptions::new().preserve_data());
        source.fire("bar", json!({"x": 1})).unwrap();
        assert!(seen.get());
    }
}
