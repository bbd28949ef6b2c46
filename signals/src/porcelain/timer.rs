use std::time::Duration;

use crate::signal::{Readable, Signal};

/// A signal that fires `payload` once, after `delay`.
///
/// Must be called from within a tokio runtime. The delay starts immediately, whether or not anybody listens; a
/// payload firing with no listeners goes to the global default listener like any other dispatch.
pub fn timeout_signal<T: Send + 'static>(delay: Duration, payload: T) -> Readable<T> {
    let signal = Signal::new();
    let readable = signal.read_only();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        tracing::trace!(?delay, "timeout signal fired");
        signal.dispatch(payload);
    });
    readable
}

/// Like [`timeout_signal`], with the payload (typically an error describing the timeout) built when the delay elapses
pub fn error_signal<E, F>(delay: Duration, make_error: F) -> Readable<E>
where
    E: Send + 'static,
    F: FnOnce() -> E + Send + 'static,
{
    let signal = Signal::new();
    let readable = signal.read_only();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        tracing::trace!(?delay, "error signal fired");
        signal.dispatch(make_error());
    });
    readable
}
