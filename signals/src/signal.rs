use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::{
    error::SignalError,
    listener::{IntoListener, Listener, ListenerId},
    slot::Slot,
    slot_list::SlotList,
};

/// How many values a signal carries per dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Dispatched with [`OnceSignal::notify`]
    Zero,
    /// Dispatched with [`OnceSignal::dispatch`]
    One,
}

impl Arity {
    pub fn values(self) -> usize {
        match self {
            Arity::Zero => 0,
            Arity::One => 1,
        }
    }
}

/// What a dispatch pass does when a slot fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// The first failure aborts the pass. Slots not reached yet stay registered but don't run this time.
    /// A panicking listener unwinds through `dispatch`.
    #[default]
    FailFast,
    /// Every slot of the pass runs. Panics are caught, failures are logged and the first one is returned at the end.
    ///
    /// Panics can only be caught when they unwind: under `panic = "abort"` (as in this workspace's release profile)
    /// a panicking listener still aborts the process.
    ContinueOnError,
}

pub(crate) struct Registry<T> {
    // swapped for a new list on every change, never edited
    slots: RefCell<SlotList<T>>,
    arity: Arity,
    mode: Cell<DispatchMode>,
}

impl<T> Registry<T> {
    pub(crate) fn slots(&self) -> SlotList<T> { self.slots.borrow().clone() }

    fn swap(&self, slots: SlotList<T>) {
        trace!("slot list swapped: {}", slots);
        let old = std::mem::replace(&mut *self.slots.borrow_mut(), slots);
        // Dropping the old list may run listener destructors that reach back into this registry
        drop(old);
    }

    pub(crate) fn remove(&self, listener: ListenerId) -> Option<Slot<T>> {
        let slots = self.slots();
        let slot = slots.find(listener)?;
        self.swap(slots.filter_not(listener));
        debug!("removed listener {}", listener);
        Some(slot)
    }
}

/// A signal whose listeners are all one-shot: each registration runs for at most one dispatch.
///
/// Cloning yields another handle to the same registry.
pub struct OnceSignal<T>(Rc<Registry<T>>);

impl<T> Clone for OnceSignal<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> std::fmt::Debug for OnceSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnceSignal").field("arity", &self.0.arity).field("listeners", &self.num_listeners()).finish()
    }
}

impl<T> Default for OnceSignal<T> {
    fn default() -> Self { Self::new() }
}

impl OnceSignal<()> {
    /// A signal that carries no value. Dispatch it with [`OnceSignal::notify`].
    pub fn notify_only() -> Self { Self::with_arity(Arity::Zero) }
}

impl<T> OnceSignal<T> {
    /// A signal that carries one value per dispatch
    pub fn new() -> Self { Self::with_arity(Arity::One) }

    fn with_arity(arity: Arity) -> Self {
        Self(Rc::new(Registry { slots: RefCell::new(SlotList::NIL), arity, mode: Cell::new(DispatchMode::default()) }))
    }

    pub(crate) fn weak_registry(&self) -> Weak<Registry<T>> { Rc::downgrade(&self.0) }

    /// A handle that does not keep the signal alive. See [`WeakOnceSignal`].
    pub fn downgrade(&self) -> WeakOnceSignal<T> { WeakOnceSignal(self.weak_registry()) }

    pub fn arity(&self) -> Arity { self.0.arity }

    pub fn dispatch_mode(&self) -> DispatchMode { self.0.mode.get() }

    pub fn set_dispatch_mode(&self, mode: DispatchMode) { self.0.mode.set(mode) }

    /// Registers a listener that is removed right before its first execution.
    ///
    /// Registering a listener that is already present as once returns its existing slot. Registering one that is
    /// present as persistent fails with [`SignalError::InvalidState`].
    pub fn add_once<L>(&self, listener: L) -> Result<Slot<T>, SignalError>
    where L: IntoListener<T> {
        self.register(listener.into_listener(), true, None)
    }

    /// Like [`OnceSignal::add_once`], placing the slot after every slot of equal or higher priority
    pub fn add_once_with_priority<L>(&self, listener: L, priority: i32) -> Result<Slot<T>, SignalError>
    where L: IntoListener<T> {
        self.register(listener.into_listener(), true, Some(priority))
    }

    /// Removes the slot registered for `listener`, which may be given as the [`Slot`] handle, the [`Listener`] or
    /// its [`ListenerId`]. The registry is untouched when nothing matches.
    pub fn remove(&self, listener: impl Into<ListenerId>) -> Option<Slot<T>> { self.0.remove(listener.into()) }

    pub fn remove_all(&self) {
        debug!("removing all listeners");
        self.0.swap(SlotList::NIL);
    }

    pub fn num_listeners(&self) -> usize { self.0.slots.borrow().len() }

    /// The current list of slots. Later registrations and removals don't affect the returned value.
    pub fn slots(&self) -> SlotList<T> { self.0.slots() }

    /// Moves a registered slot to the position its current priority calls for.
    /// Returns false if the slot is not registered with this signal.
    pub fn reposition(&self, slot: &Slot<T>) -> bool {
        let slots = self.0.slots();
        if !slots.iter().any(|s| s == slot) {
            return false;
        }
        self.0.swap(slots.filter_not(slot).insert_with_priority(slot.clone()));
        true
    }

    fn register(&self, listener: Listener<T>, once: bool, priority: Option<i32>) -> Result<Slot<T>, SignalError> {
        let slots = self.0.slots();
        if let Some(existing) = slots.find(&listener) {
            if existing.once() != once {
                return Err(SignalError::InvalidState { listener: listener.id(), registered_once: existing.once(), requested_once: once });
            }
            trace!("listener {} is already registered", listener.id());
            return Ok(existing);
        }

        let slot = Slot::create(Some(listener), Some(self), once, priority.unwrap_or(0))?;
        let slots = match priority {
            Some(_) => slots.insert_with_priority(slot.clone()),
            // Default registrations go in front unless a higher priority slot leads the list
            None => match slots.head() {
                Some(head) if head.priority() > slot.priority() => slots.insert_with_priority(slot.clone()),
                _ => slots.prepend(slot.clone()),
            },
        };
        self.0.swap(slots);
        debug!("registered listener {} (once: {}, priority: {})", slot.listener_id(), once, slot.priority());
        Ok(slot)
    }
}

impl<T> OnceSignal<T>
where T: Clone
{
    /// Sends `value` to every slot registered when the call starts
    pub fn dispatch(&self, value: T) -> Result<(), SignalError> { self.emit(Some(value)) }

    /// Fires a signal that carries no value
    pub fn notify(&self) -> Result<(), SignalError> { self.emit(None) }

    /// Dispatches with an optional value, which must match the signal's [`Arity`].
    ///
    /// The walk runs over the list as it was when the call started: slots added meanwhile wait for the next dispatch,
    /// and slots removed meanwhile still run in this one.
    pub fn emit(&self, value: Option<T>) -> Result<(), SignalError> {
        let expected = self.0.arity.values();
        let given = usize::from(value.is_some());
        if expected != given {
            return Err(SignalError::TypeMismatch { expected, given });
        }

        let snapshot = self.0.slots();
        trace!("dispatching to {}", snapshot);
        match self.dispatch_mode() {
            DispatchMode::FailFast => {
                for slot in &snapshot {
                    trace!("executing {}", slot);
                    slot.execute(value.as_ref())?;
                }
                Ok(())
            }
            DispatchMode::ContinueOnError => {
                let mut first = None;
                for slot in &snapshot {
                    trace!("executing {}", slot);
                    let result = match panic::catch_unwind(AssertUnwindSafe(|| slot.execute(value.as_ref()))) {
                        Ok(result) => result,
                        Err(payload) => Err(SignalError::ListenerPanicked { listener: slot.listener_id(), message: panic_message(payload) }),
                    };
                    if let Err(e) = result {
                        warn!("listener {} failed: {}", slot.listener_id(), e);
                        if first.is_none() {
                            first = Some(e);
                        }
                    }
                }
                first.map_or(Ok(()), Err)
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => message.to_string(),
            Err(_) => "<non-string panic payload>".to_string(),
        },
    }
}

/// A handle to a [`OnceSignal`] that does not keep its registry alive.
///
/// A listener that holds a strong handle to its own signal forms a reference cycle (registry, slot list, slot,
/// listener, registry) and the whole registry leaks once every outside handle is gone. Listeners that need to reach
/// their signal should capture one of these and upgrade it when they run.
pub struct WeakOnceSignal<T>(Weak<Registry<T>>);

impl<T> Clone for WeakOnceSignal<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> std::fmt::Debug for WeakOnceSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakOnceSignal").field("alive", &(self.0.strong_count() > 0)).finish()
    }
}

impl<T> WeakOnceSignal<T> {
    /// The signal, unless every strong handle to it has been dropped
    pub fn upgrade(&self) -> Option<OnceSignal<T>> { self.0.upgrade().map(OnceSignal) }
}

/// A handle to a [`Signal`] that does not keep its registry alive. See [`WeakOnceSignal`].
pub struct WeakSignal<T>(WeakOnceSignal<T>);

impl<T> Clone for WeakSignal<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> std::fmt::Debug for WeakSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakSignal").field("alive", &(self.0.0.strong_count() > 0)).finish()
    }
}

impl<T> WeakSignal<T> {
    pub fn upgrade(&self) -> Option<Signal<T>> { self.0.upgrade().map(Signal) }
}

/// A signal accepting both persistent and one-shot listeners.
///
/// Everything except the persistent registrations comes from [`OnceSignal`] through `Deref`.
pub struct Signal<T>(OnceSignal<T>);

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("arity", &self.arity()).field("listeners", &self.num_listeners()).finish()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Deref for Signal<T> {
    type Target = OnceSignal<T>;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl Signal<()> {
    /// A signal that carries no value. Dispatch it with [`OnceSignal::notify`].
    pub fn notify_only() -> Self { Self(OnceSignal::notify_only()) }
}

impl<T> Signal<T> {
    pub fn new() -> Self { Self(OnceSignal::new()) }

    /// A handle that does not keep the signal alive, for listeners that talk back to their own signal
    pub fn downgrade(&self) -> WeakSignal<T> { WeakSignal(self.0.downgrade()) }

    /// Registers a listener that stays until removed.
    ///
    /// The slot goes to the front of the list, after any slots of higher priority. Registering a listener that is
    /// already present returns its existing slot; if it is present as once this fails with
    /// [`SignalError::InvalidState`].
    pub fn add<L>(&self, listener: L) -> Result<Slot<T>, SignalError>
    where L: IntoListener<T> {
        self.0.register(listener.into_listener(), false, None)
    }

    /// Registers a persistent listener, placing it after every slot of equal or higher priority
    pub fn add_with_priority<L>(&self, listener: L, priority: i32) -> Result<Slot<T>, SignalError>
    where L: IntoListener<T> {
        self.0.register(listener.into_listener(), false, Some(priority))
    }
}
