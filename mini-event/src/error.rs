//! Errors raised by event registration and dispatch.

/// Errors produced by the event system.
///
/// Every variant is an invalid-argument failure raised synchronously at the
/// call site. Everything else (duplicate registration, removing an unknown
/// handler, firing with no listeners) is a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("no event type specified")]
    MissingType,
    #[error("cannot fire the global event `*`")]
    GlobalFire,
    #[error("event handler must be a callback or `false`")]
    InvalidHandler,
}

impl EventError {
    /// Whether the error was caused by a bad argument.
    ///
    /// All current variants are; callers matching on the taxonomy should
    /// use this rather than enumerate variants.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            EventError::MissingType | EventError::GlobalFire | EventError::InvalidHandler
        )
    }
}
