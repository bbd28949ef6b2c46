use indexmap::IndexSet;
use std::collections::HashMap;

use crate::listener::{Key, ListenerId};

/// Bookkeeping that lets a listener be found again by its own identity or by any key it was registered under.
///
/// Keys are either tags or other listeners (a one-shot wrapper is registered under the listener it wraps).
#[derive(Debug, Default)]
pub struct TagMap {
    /// key -> listeners registered under it, in registration order
    by_key: HashMap<Key, IndexSet<ListenerId>>,
    /// listener -> keys it was registered under. Presence means "registered".
    by_listener: HashMap<ListenerId, Vec<Key>>,
}

impl TagMap {
    pub fn new() -> Self { Self::default() }

    /// Records `listener` as registered and associates it with every key in `keys`
    pub fn set_listeners(&mut self, listener: ListenerId, keys: impl IntoIterator<Item = Key>) {
        let associated = self.by_listener.entry(listener).or_default();
        for key in keys {
            if !associated.contains(&key) {
                associated.push(key);
            }
            self.by_key.entry(key).or_default().insert(listener);
        }
    }

    /// Every listener matching `key`: listeners registered under it, plus the listener itself if `key` names a registered one
    pub fn get_listeners(&self, key: Key) -> IndexSet<ListenerId> {
        let mut found = self.by_key.get(&key).cloned().unwrap_or_default();
        if let Key::Listener(id) = key {
            if self.by_listener.contains_key(&id) {
                found.insert(id);
            }
        }
        found
    }

    /// Forgets `listener` and all of its associations. Idempotent.
    pub fn clear_listener(&mut self, listener: ListenerId) {
        let Some(keys) = self.by_listener.remove(&listener) else { return };
        for key in keys {
            if let Some(listeners) = self.by_key.get_mut(&key) {
                listeners.shift_remove(&listener);
                if listeners.is_empty() {
                    self.by_key.remove(&key);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.by_key.clear();
        self.by_listener.clear();
    }
}
