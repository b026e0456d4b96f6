use slot_signals::Listener;
use std::{cell::RefCell, fmt::Display, rc::Rc, str::FromStr};
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

/// A listener that records every value it receives, and a function draining what it recorded
#[allow(unused)]
pub fn change_watcher<T: 'static>() -> (Listener<T>, impl Fn() -> Vec<T>) {
    let changes = Rc::new(RefCell::new(Vec::new()));
    let watcher = {
        let changes = changes.clone();
        Listener::new(move |value: T| changes.borrow_mut().push(value))
    };

    let check = move || changes.borrow_mut().drain(..).collect::<Vec<T>>();

    (watcher, check)
}

/// Shared record of listener calls, in call order, across several listeners
#[allow(unused)]
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

#[allow(unused)]
impl CallLog {
    pub fn new() -> Self { Self::default() }

    /// A listener logging `name(value)` on each call
    pub fn listener<T: Display + 'static>(&self, name: &'static str) -> Listener<T> {
        let log = self.clone();
        Listener::new(move |value: T| log.push(format!("{name}({value})")))
    }

    /// A notify-only listener logging `name()` on each call
    pub fn notifier<T>(&self, name: &'static str) -> Listener<T> {
        let log = self.clone();
        Listener::notify_only(move || log.push(format!("{name}()")))
    }

    pub fn push(&self, entry: String) { self.0.borrow_mut().push(entry) }

    /// Drains the log
    pub fn take(&self) -> Vec<String> { self.0.borrow_mut().drain(..).collect() }
}
