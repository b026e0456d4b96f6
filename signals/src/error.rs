use thiserror::Error;

use crate::listener::ListenerId;

/// Errors raised by the slot registry. All of them are reported synchronously by the call that detects them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// A required argument was absent, or a list was built from a malformed head/tail pair
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The listener is already registered with the opposite once-ness
    #[error("listener {listener} is already registered with once = {registered_once}; remove it before registering with once = {requested_once}")]
    InvalidState { listener: ListenerId, registered_once: bool, requested_once: bool },

    /// A slot was pointed at a listener identity that another slot of the same signal already holds
    #[error("listener {0} is already registered with this signal")]
    DuplicateListener(ListenerId),

    /// The number of values offered does not match what the signal or listener accepts
    #[error("type mismatch: expected {expected} value(s), got {given}")]
    TypeMismatch { expected: usize, given: usize },

    #[error("internal consistency: {0}")]
    InternalConsistency(&'static str),

    /// A listener panicked while the signal was dispatching in [`DispatchMode::ContinueOnError`](crate::DispatchMode)
    #[error("listener {listener} panicked: {message}")]
    ListenerPanicked { listener: ListenerId, message: String },
}

