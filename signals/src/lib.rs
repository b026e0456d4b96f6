/*!
Synchronous signals backed by a persistent slot registry

# Design requirements:
- Listeners register with a signal and are called back synchronously, in priority order, when it dispatches
- A listener identity is registered at most once per signal
- The registry is an immutable list: every add/remove builds a new list sharing the untouched nodes, and the signal
  swaps its reference to it. No locks.
- A dispatch walks the list as it was when the dispatch started, so listeners may add, remove or re-dispatch while
  they run without disturbing the pass in progress
- Once slots remove themselves right before they run
- Single threaded. Signals are `!Send`; callers that need to share one across threads must serialize access themselves.

# Nomenclature:
- slot - one registration: the listener plus its once flag, priority, enabled flag and bound parameters
- listener identity - the [`ListenerId`] of the shared callable. Keep the [`Slot`] (or a clone of the [`Listener`])
  around to remove it later; an equivalent closure built again is a different listener.

# Basic usage

```rust
use slot_signals::*;
use std::{cell::RefCell, rc::Rc};

let log = Rc::new(RefCell::new(Vec::new()));
let signal = Signal::<i32>::new();

let f = { let log = log.clone(); move |v: i32| log.borrow_mut().push(format!("f({v})")) };
let g = { let log = log.clone(); move |v: i32| log.borrow_mut().push(format!("g({v})")) };
let h = { let log = log.clone(); move |v: i32| log.borrow_mut().push(format!("h({v})")) };

signal.add_with_priority(f, 1).unwrap();
signal.add_with_priority(g, 5).unwrap();
signal.dispatch(42).unwrap();
assert_eq!(*log.borrow(), ["g(42)", "f(42)"]);

log.borrow_mut().clear();
signal.add_once(h).unwrap();
signal.dispatch(1).unwrap();
signal.dispatch(2).unwrap();
assert_eq!(*log.borrow(), ["g(1)", "f(1)", "h(1)", "g(2)", "f(2)"]);
assert_eq!(signal.num_listeners(), 2);
```

# Removing listeners

```rust
use slot_signals::*;

let signal = Signal::<String>::new();
let listener = Listener::new(|name: String| println!("hello {name}"));

let slot = signal.add(listener.clone()).unwrap();
// the same listener again is the same registration
assert_eq!(signal.add(listener.clone()).unwrap(), slot);
// but it can't switch to once without being removed first
assert!(signal.add_once(listener.clone()).is_err());

assert_eq!(signal.remove(&slot), Some(slot));
assert_eq!(signal.num_listeners(), 0);
```

# Listeners that talk back to their signal

A signal owns its slots and a slot owns its listener, so a listener capturing a [`Signal`] clone keeps its own
registry alive and it is never freed. Capture a [`WeakSignal`] instead and upgrade it when the listener runs.

```rust
use slot_signals::*;

let signal = Signal::<u32>::new();
let weak = signal.downgrade();
signal
    .add(move |n: u32| {
        if let Some(signal) = weak.upgrade().filter(|_| n > 0) {
            signal.dispatch(n - 1).unwrap();
        }
    })
    .unwrap();
signal.dispatch(3).unwrap();

let weak = signal.downgrade();
drop(signal);
assert!(weak.upgrade().is_none());
```

# Signals without a value

```rust
use slot_signals::*;

let ready = Signal::notify_only();
ready.add(Listener::notify_only(|| println!("ready"))).unwrap();
ready.notify().unwrap();
// a zero-argument signal refuses a value
assert!(matches!(ready.dispatch(()), Err(SignalError::TypeMismatch { expected: 0, given: 1 })));
```
*/

mod error;
mod listener;
mod signal;
mod slot;
mod slot_list;

pub use error::*;
pub use listener::*;
pub use signal::{Arity, DispatchMode, OnceSignal, Signal, WeakOnceSignal, WeakSignal};
pub use slot::*;
pub use slot_list::*;
