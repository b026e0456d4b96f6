use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::{
    error::SignalError,
    listener::{Listener, ListenerId},
    signal::{OnceSignal, Registry},
};

/// A subscription handle returned by registering a listener with a signal.
///
/// The listener, its once-ness and the owning signal are fixed when the slot is created. Priority, enabled and the
/// bound parameters can be changed in place through any clone of the handle; they never change the order of a list
/// the slot already sits in (see [`OnceSignal::reposition`]).
pub struct Slot<T>(Rc<SlotInner<T>>);

struct SlotInner<T> {
    listener: RefCell<Listener<T>>,
    // does not keep the signal alive
    signal: Weak<Registry<T>>,
    once: bool,
    priority: Cell<i32>,
    enabled: Cell<bool>,
    bound_params: RefCell<Vec<T>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}
impl<T> Eq for Slot<T> {}

impl<T> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("listener", &self.listener_id())
            .field("once", &self.0.once)
            .field("priority", &self.0.priority.get())
            .field("enabled", &self.0.enabled.get())
            .field("bound_params", &self.0.bound_params.borrow().len())
            .finish()
    }
}

impl<T> std::fmt::Display for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Slot listener: {}, once: {}, priority: {}, enabled: {}]", self.listener_id(), self.0.once, self.priority(), self.enabled())
    }
}

impl<T> From<&Slot<T>> for ListenerId {
    fn from(slot: &Slot<T>) -> Self { slot.listener_id() }
}

impl<T> Slot<T> {
    /// Creates a slot owned by `signal`.
    ///
    /// Fails with [`SignalError::InvalidArgument`] when no listener is given and with
    /// [`SignalError::InternalConsistency`] when no owning signal is given: a slot must be able to remove itself.
    pub fn create(listener: Option<Listener<T>>, signal: Option<&OnceSignal<T>>, once: bool, priority: i32) -> Result<Self, SignalError> {
        let listener = listener.ok_or(SignalError::InvalidArgument("listener is absent"))?;
        let signal = signal.ok_or(SignalError::InternalConsistency("slot created without an owning signal"))?;
        Ok(Self(Rc::new(SlotInner {
            listener: RefCell::new(listener),
            signal: signal.weak_registry(),
            once,
            priority: Cell::new(priority),
            enabled: Cell::new(true),
            bound_params: RefCell::new(Vec::new()),
        })))
    }

    pub fn listener(&self) -> Listener<T> { self.0.listener.borrow().clone() }

    pub fn listener_id(&self) -> ListenerId { self.0.listener.borrow().id() }

    /// Replaces the listener. `None` is rejected: disable the slot with [`Slot::set_enabled`] instead.
    pub fn set_listener(&self, listener: Option<Listener<T>>) -> Result<(), SignalError> {
        let listener = listener.ok_or(SignalError::InvalidArgument("listener is absent; set enabled to false instead"))?;
        if let Some(signal) = self.0.signal.upgrade() {
            if let Some(existing) = signal.slots().find(&listener) {
                if existing != *self {
                    return Err(SignalError::DuplicateListener(listener.id()));
                }
            }
        }
        let old = std::mem::replace(&mut *self.0.listener.borrow_mut(), listener);
        // may run destructors that call back into this slot
        drop(old);
        Ok(())
    }

    /// Whether the slot removes itself the first time it executes
    pub fn once(&self) -> bool { self.0.once }

    pub fn priority(&self) -> i32 { self.0.priority.get() }

    pub fn set_priority(&self, priority: i32) { self.0.priority.set(priority) }

    /// Whether the listener is called on execution. Defaults to true.
    pub fn enabled(&self) -> bool { self.0.enabled.get() }

    pub fn set_enabled(&self, enabled: bool) { self.0.enabled.set(enabled) }

    pub fn bound_params(&self) -> Vec<T>
    where T: Clone {
        self.0.bound_params.borrow().clone()
    }

    /// Values passed to the listener in place of the dispatched value. An empty sequence clears the override.
    pub fn set_bound_params(&self, params: Vec<T>) {
        let old = std::mem::replace(&mut *self.0.bound_params.borrow_mut(), params);
        drop(old);
    }

    /// Removes this slot from its signal. Returns `None` if it was not registered or the signal is gone.
    pub fn remove(&self) -> Option<Slot<T>> {
        match self.0.signal.upgrade() {
            Some(signal) => match signal.slots().find(self.listener_id()) {
                Some(registered) if registered == *self => signal.remove(self.listener_id()),
                _ => None,
            },
            None => {
                debug!("slot {} outlived its signal", self.listener_id());
                None
            }
        }
    }

    /// Runs the listener once.
    ///
    /// A once slot is removed from its signal before the listener runs, so the listener sees the updated registry
    /// and may register itself again. Bound parameters take precedence over `value`.
    pub fn execute(&self, value: Option<&T>) -> Result<(), SignalError>
    where T: Clone {
        if !self.enabled() {
            trace!("slot {} is disabled", self.listener_id());
            return Ok(());
        }
        if self.0.once {
            self.remove();
        }

        // No borrow may be held while the listener runs; it is free to edit this slot.
        let listener = self.listener();
        match listener {
            Listener::NotifyOnly(f) => f(),
            Listener::Payload(f) => {
                let value = {
                    let params = self.0.bound_params.borrow();
                    match (params.as_slice(), value) {
                        ([bound], _) => bound.clone(),
                        ([], Some(value)) => value.clone(),
                        ([], None) => return Err(SignalError::TypeMismatch { expected: 1, given: 0 }),
                        (params, _) => return Err(SignalError::TypeMismatch { expected: 1, given: params.len() }),
                    }
                };
                f(value)
            }
        }
        Ok(())
    }
}
