use relay_signals::Listener;
use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};
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

/// A listener recording every payload it receives, and a check function draining what was recorded so far
#[allow(unused)]
pub fn watcher<T: Clone + Send + 'static>() -> (Listener<T>, Box<dyn Fn() -> Vec<T> + Send + Sync>) {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let listener = {
        let changes = changes.clone();
        Listener::new(move |payload: &T| {
            changes.lock().unwrap().push(payload.clone());
        })
    };

    let check = Box::new(move || {
        let changes: Vec<T> = changes.lock().unwrap().drain(..).collect();
        changes
    });

    (listener, check)
}
