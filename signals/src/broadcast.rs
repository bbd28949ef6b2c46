use indexmap::IndexMap;
use std::any::Any;
use std::sync::RwLock;

use crate::{
    context,
    listener::{Key, Listener, ListenerId, Tag},
    traits::BaseSignal,
};

/// What a broadcast does with a payload when nobody is listening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fallback {
    /// Instance default listener if set, otherwise the process-wide default listener
    Defaults,
    /// Instance default listener if set, otherwise drop the payload
    Silent,
}

/// The root listener set: an ordered, identity-deduplicated collection of listeners and the fan-out over it.
///
/// Knows nothing about tags; those are resolved by the signal layer above before anything reaches `remove`.
pub(crate) struct Broadcast<T> {
    listeners: RwLock<IndexMap<ListenerId, Listener<T>>>,
    default_listener: RwLock<Option<Listener<T>>>,
    fallback: Fallback,
}

impl<T: 'static> std::fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcast").field("listeners", &self.len()).field("fallback", &self.fallback).finish()
    }
}

impl<T: 'static> Broadcast<T> {
    pub fn new(fallback: Fallback) -> Self { Self { listeners: RwLock::new(IndexMap::new()), default_listener: RwLock::new(None), fallback } }

    /// Adds a listener unless one with the same identity is already present
    pub fn insert(&self, listener: Listener<T>) { self.listeners.write().expect("listeners lock poisoned").entry(listener.id()).or_insert(listener); }

    pub fn remove(&self, id: ListenerId) -> bool {
        // dropped after the lock is released, a listener's captures may re-enter on drop
        let removed = self.listeners.write().expect("listeners lock poisoned").shift_remove(&id);
        removed.is_some()
    }

    pub fn contains(&self, id: ListenerId) -> bool { self.listeners.read().expect("listeners lock poisoned").contains_key(&id) }

    pub fn len(&self) -> usize { self.listeners.read().expect("listeners lock poisoned").len() }

    /// Drops every listener. Listeners mid-dispatch are skipped from here on.
    pub fn clear(&self) -> usize {
        let removed = std::mem::take(&mut *self.listeners.write().expect("listeners lock poisoned"));
        removed.len()
    }

    pub fn set_default_listener(&self, listener: Listener<T>) { *self.default_listener.write().expect("default listener lock poisoned") = Some(listener); }

    /// Calls every listener with `payload`, in registration order.
    ///
    /// The listener set is snapshotted before the first call and no lock is held while listeners run, so listeners may
    /// add, remove and dispatch re-entrantly. Listeners added during the fan-out are not called by it; listeners removed
    /// during the fan-out are not called after their removal.
    pub fn send(&self, payload: &T) {
        let snapshot = {
            let listeners = self.listeners.read().expect("listeners lock poisoned");
            listeners.values().cloned().collect::<Vec<_>>()
        };

        if snapshot.is_empty() {
            self.send_to_default(payload);
            return;
        }

        for listener in snapshot {
            if self.contains(listener.id()) {
                listener.call(payload);
            }
        }
    }

    fn send_to_default(&self, payload: &T) {
        let instance_default = self.default_listener.read().expect("default listener lock poisoned").clone();
        match (instance_default, self.fallback) {
            (Some(listener), _) => {
                tracing::trace!("no listeners, dispatching to instance default listener");
                listener.call(payload)
            }
            (None, Fallback::Defaults) => {
                tracing::trace!("no listeners, dispatching to global default listener");
                context::call_global_default_listener(payload as &dyn Any)
            }
            (None, Fallback::Silent) => {}
        }
    }
}

impl<T: 'static> BaseSignal<T> for Broadcast<T> {
    // tags are the signal layer's business
    fn add_tagged(&self, listener: Listener<T>, _tags: &[Tag]) { self.insert(listener) }

    fn remove_key(&self, key: Key) {
        if let Key::Listener(id) = key {
            self.remove(id);
        }
    }
}
