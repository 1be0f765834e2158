//! Handler, binding context and registration types.

use crate::error::EventError;
use crate::event::Event;
use crate::target::TargetId;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

type CallbackFn = Rc<dyn Fn(&mut Event, &Context)>;

/// A registered event handler.
///
/// Equality is identity: two handlers are equal when they are clones of the
/// same [`Handler::new`] call, or when both are [`Handler::Cancel`].
#[derive(Clone)]
pub enum Handler {
    /// A callback invoked with the event and its binding context.
    Callback(CallbackFn),
    /// The `false` sentinel: prevents the default action and stops
    /// propagation without running any code.
    Cancel,
}

impl Handler {
    /// Wrap a closure as a handler.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut Event, &Context) + 'static,
    {
        Handler::Callback(Rc::new(callback))
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Handler::Cancel)
    }

    /// Run the handler against `event`, with `this` as its binding.
    pub(crate) fn invoke(&self, event: &mut Event, this: &Context) {
        match self {
            Handler::Callback(callback) => callback(event, this),
            Handler::Cancel => {
                event.prevent_default();
                event.stop_propagation();
            }
        }
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Handler::Callback(a), Handler::Callback(b)) => Rc::ptr_eq(a, b),
            (Handler::Cancel, Handler::Cancel) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Callback(callback) => {
                write!(f, "Handler::Callback({:p})", Rc::as_ptr(callback).cast::<()>())
            }
            Handler::Cancel => write!(f, "Handler::Cancel"),
        }
    }
}

/// Only `false` names a handler; `true` is rejected.
impl TryFrom<bool> for Handler {
    type Error = EventError;

    fn try_from(value: bool) -> Result<Self, Self::Error> {
        if value {
            Err(EventError::InvalidHandler)
        } else {
            Ok(Handler::Cancel)
        }
    }
}

/// Dynamic values (for example handlers declared in a wiring file) can only
/// denote the `false` sentinel.
impl TryFrom<&Value> for Handler {
    type Error = EventError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(flag) => Handler::try_from(*flag),
            _ => Err(EventError::InvalidHandler),
        }
    }
}

/// The binding a handler runs against (its `this`).
///
/// Contexts are compared by identity: targets by [`TargetId`], objects by
/// the address of their shared allocation.
#[derive(Clone)]
pub enum Context {
    /// An event target, identified by its id.
    Target(TargetId),
    /// Any shared value.
    Object(Rc<dyn Any>),
}

impl Context {
    /// Bind a fresh shared value.
    pub fn object<T: Any>(value: T) -> Self {
        Context::Object(Rc::new(value))
    }

    /// Bind an existing shared value, keeping its identity.
    pub fn shared<T: Any>(value: Rc<T>) -> Self {
        Context::Object(value)
    }

    pub fn target_id(&self) -> Option<TargetId> {
        match self {
            Context::Target(id) => Some(*id),
            Context::Object(_) => None,
        }
    }

    /// Borrow the bound value as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Context::Object(value) => value.downcast_ref::<T>(),
            Context::Target(_) => None,
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Context::Target(a), Context::Target(b)) => a == b,
            (Context::Object(a), Context::Object(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Target(id) => write!(f, "Context::Target({id})"),
            Context::Object(value) => {
                write!(f, "Context::Object({:p})", Rc::as_ptr(value).cast::<()>())
            }
        }
    }
}

impl From<TargetId> for Context {
    fn from(id: TargetId) -> Self {
        Context::Target(id)
    }
}

/// Options accepted when registering a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListenOptions {
    /// Binding used instead of the executing target.
    pub this: Option<Context>,
    /// Remove the registration after its first invocation.
    pub once: bool,
}

impl ListenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn this(mut self, this: impl Into<Context>) -> Self {
        self.this = Some(this.into());
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

/// One live entry of an [`EventQueue`](super::EventQueue).
#[derive(Debug, Clone)]
pub(crate) struct Registration {
    pub handler: Handler,
    pub this: Option<Context>,
    pub once: bool,
}

impl Registration {
    pub fn new(handler: Handler, options: ListenOptions) -> Self {
        Self {
            handler,
            this: options.this,
            once: options.once,
        }
    }

    /// Same handler and same binding, with "no binding" matching only itself.
    pub fn is_identical(&self, handler: &Handler, this: Option<&Context>) -> bool {
        self.handler == *handler && self.this.as_ref() == this
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_identity() {
        let a = Handler::new(|_, _| {});
        let b = Handler::new(|_, _| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(Handler::Cancel, Handler::Cancel);
        assert_ne!(a, Handler::Cancel);
    }

    #[test]
    fn test_handler_from_dynamic_values() {
        assert_eq!(Handler::try_from(false), Ok(Handler::Cancel));
        assert_eq!(Handler::try_from(true), Err(EventError::InvalidHandler));
        assert_eq!(
            Handler::try_from(&Value::Bool(false)),
            Ok(Handler::Cancel)
        );
        assert_eq!(
            Handler::try_from(&serde_json::json!({})),
            Err(EventError::InvalidHandler)
        );
        assert!(
            Handler::try_from(&Value::from("log"))
                .unwrap_err()
                .is_invalid_argument()
        );
    }

    #[test]
    fn test_context_identity() {
        let shared = Rc::new(1_u32);
        let a = Context::shared(Rc::clone(&shared));
        let b = Context::shared(Rc::clone(&shared));
        let c = Context::object(1_u32);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(c.downcast_ref::<u32>(), Some(&1));
        assert_eq!(c.downcast_ref::<String>(), None);

        let id = TargetId::new();
        assert_eq!(Context::from(id), Context::Target(id));
        assert_eq!(Context::from(id).target_id(), Some(id));
        assert_ne!(Context::from(id), Context::Target(TargetId::new()));
    }

    #[test]
    fn test_registration_identity_unifies_missing_binding() {
        let handler = Handler::new(|_, _| {});
        let bound = Context::object("x");
        let plain = Registration::new(handler.clone(), ListenOptions::new());
        let with_this = Registration::new(handler.clone(), ListenOptions::new().this(bound.clone()));

        assert!(plain.is_identical(&handler, None));
        assert!(!plain.is_identical(&handler, Some(&bound)));
        assert!(with_this.is_identical(&handler, Some(&bound)));
        assert!(!with_this.is_identical(&handler, None));
    }
}
