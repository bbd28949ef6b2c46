use std::ops::Deref;
use std::sync::Arc;

use crate::{
    broadcast::{Broadcast, Fallback},
    hooks::ClearHooks,
    listener::{IntoListener, Key, Tag},
    signal::Readable,
    traits::AsTag,
};

/// A signal that can be dispatched on.
///
/// Dereferences to [`Readable`] for listening and deriving. Cloning a `Signal` shares the same listeners.
pub struct Signal<T> {
    broadcast: Arc<Broadcast<T>>,
    readable: Readable<T>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self { Self { broadcast: self.broadcast.clone(), readable: self.readable.clone() } }
}

impl<T: 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("broadcast", &self.broadcast).field("readable", &self.readable).finish()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self { Self::new() }
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        let broadcast = Arc::new(Broadcast::new(Fallback::Defaults));
        let readable = Readable::from_base(broadcast.clone(), ClearHooks::new());
        Self { broadcast, readable }
    }

    /// Calls every listener with `payload`, in registration order.
    ///
    /// With no listeners registered, the payload goes to this signal's default listener if one was set, otherwise to
    /// the global default listener (a no-op unless configured). A panicking listener propagates out of `dispatch` and
    /// the listeners after it are not called.
    pub fn dispatch(&self, payload: T) { self.broadcast.send(&payload) }

    /// Sets the listener that receives payloads dispatched while no listener is registered. Last write wins.
    pub fn set_default_listener(&self, listener: impl IntoListener<T>) { self.broadcast.set_default_listener(listener.into_listener()) }

    /// Runs every post-clear hook, then drops every listener.
    ///
    /// The hooks kill caches attached to this signal or anything derived from it, and detach the listeners of derived
    /// signals. New listeners and new caches can be attached afterwards, through this signal or any derived one, and
    /// behave normally.
    pub fn clear(&self) {
        let hooks = self.readable.hooks().run();
        let listeners = self.broadcast.clear();
        tracing::debug!(hooks, listeners, "signal cleared");
    }

    /// Number of listeners registered directly on this signal, including adapters of derived signals and cache writers
    pub fn listener_count(&self) -> usize { self.broadcast.len() }

    /// A listen-only handle sharing this signal's listeners, as opposed to [`read_only`](Readable::read_only) which
    /// creates a separate view
    pub fn readable(&self) -> Readable<T> { self.readable.clone() }
}

impl<T> Deref for Signal<T> {
    type Target = Readable<T>;

    fn deref(&self) -> &Self::Target { &self.readable }
}

impl<T: 'static> AsTag for Signal<T> {
    fn tag(&self) -> Tag { self.readable.tag() }
}

impl<T> From<&Signal<T>> for Key {
    fn from(signal: &Signal<T>) -> Self { Key::from(&signal.readable) }
}
