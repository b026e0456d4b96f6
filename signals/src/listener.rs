use std::rc::Rc;

/// A unique identifier for a listener that cannot be forged or extracted.
/// Derived from the address of the shared callable, so clones of one listener share an id
/// while two separately wrapped closures never do.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl From<ListenerId> for usize {
    fn from(id: ListenerId) -> usize { id.0 }
}
impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{:#x}", self.0) }
}

/// A listener that can be called when a signal dispatches.
/// The shape is fixed when the listener is created: full listeners receive the value,
/// notify-only listeners are simply told that the signal fired.
pub enum Listener<T> {
    /// Full listener receives the dispatched value
    Payload(Rc<dyn Fn(T) + 'static>),
    /// Unit listener only receives notification, ignores the value
    NotifyOnly(Rc<dyn Fn() + 'static>),
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        match self {
            Listener::Payload(f) => Listener::Payload(f.clone()),
            Listener::NotifyOnly(f) => Listener::NotifyOnly(f.clone()),
        }
    }
}

impl<T> std::fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Listener::Payload(_) => write!(f, "Listener::Payload({})", self.id()),
            Listener::NotifyOnly(_) => write!(f, "Listener::NotifyOnly({})", self.id()),
        }
    }
}

impl<T> Listener<T> {
    /// Wrap a closure that receives the dispatched value
    pub fn new(f: impl Fn(T) + 'static) -> Self { Listener::Payload(Rc::new(f)) }

    /// Wrap a closure that takes no arguments
    pub fn notify_only(f: impl Fn() + 'static) -> Self { Listener::NotifyOnly(Rc::new(f)) }

    pub fn id(&self) -> ListenerId {
        // The allocation stays reserved for as long as any clone of the Rc is alive,
        // and a registered slot holds one, so the address cannot be reused while it matters.
        let ptr = match self {
            Listener::Payload(f) => Rc::as_ptr(f) as *const () as usize,
            Listener::NotifyOnly(f) => Rc::as_ptr(f) as *const () as usize,
        };
        ListenerId(ptr)
    }

    /// Number of values this listener takes
    pub fn arity(&self) -> usize {
        match self {
            Listener::Payload(_) => 1,
            Listener::NotifyOnly(_) => 0,
        }
    }
}

impl<T> From<&Listener<T>> for ListenerId {
    fn from(listener: &Listener<T>) -> Self { listener.id() }
}

impl<T> From<&Rc<dyn Fn(T)>> for ListenerId {
    fn from(f: &Rc<dyn Fn(T)>) -> Self { ListenerId(Rc::as_ptr(f) as *const () as usize) }
}

impl From<&Rc<dyn Fn()>> for ListenerId {
    fn from(f: &Rc<dyn Fn()>) -> Self { ListenerId(Rc::as_ptr(f) as *const () as usize) }
}

/// Trait for types that can be converted into signal listeners.
pub trait IntoListener<T> {
    /// Convert this type into a listener that can be called on dispatch.
    fn into_listener(self) -> Listener<T>;
}

// Implementation for function types. Every call wraps the closure anew, so each
// conversion yields a fresh identity.
impl<F, T> IntoListener<T> for F
where F: Fn(T) + 'static
{
    fn into_listener(self) -> Listener<T> { Listener::Payload(Rc::new(self)) }
}

impl<T> IntoListener<T> for Listener<T> {
    fn into_listener(self) -> Listener<T> { self }
}

// Shared callables keep their identity across conversions
impl<T> IntoListener<T> for Rc<dyn Fn(T) + 'static> {
    fn into_listener(self) -> Listener<T> { Listener::Payload(self) }
}

// Rc<dyn Fn()> becomes a notify-only listener for any T
impl<T> IntoListener<T> for Rc<dyn Fn() + 'static> {
    fn into_listener(self) -> Listener<T> { Listener::NotifyOnly(self) }
}

#[cfg(feature = "tokio")]
impl<T> IntoListener<T> for tokio::sync::mpsc::UnboundedSender<T>
where T: 'static
{
    fn into_listener(self) -> Listener<T> {
        Listener::Payload(Rc::new(move |value| {
            let _ = self.send(value); // Ignore send errors
        }))
    }
}

impl<T> IntoListener<T> for std::sync::mpsc::Sender<T>
where T: 'static
{
    fn into_listener(self) -> Listener<T> {
        Listener::Payload(Rc::new(move |value| {
            let _ = self.send(value); // Ignore send errors
        }))
    }
}
