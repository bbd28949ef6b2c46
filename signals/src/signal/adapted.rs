use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{
    hooks::ClearHooks,
    listener::{Key, Listener, ListenerId, Tag},
    traits::BaseSignal,
};

/// Builds the listener registered upstream from the listener registered here
pub(crate) type Convert<T, U> = Box<dyn Fn(&Listener<U>) -> Listener<T> + Send + Sync + 'static>;

/// Runs after a listener has been registered upstream. The second argument reports whether that listener is still
/// registered, which changes if it removes itself while the hook runs.
pub(crate) type PostAdd<U> = Box<dyn Fn(&Listener<U>, &dyn Fn() -> bool) + Send + Sync + 'static>;

/// A signal with its own set of listeners, each of which is converted into an upstream listener on one or more parents.
///
/// Keeps the mapping from the listener added here to the converted listener registered upstream, so removing
/// a listener from this signal removes exactly its converted counterpart and nothing the parents got from elsewhere.
pub(crate) struct Adapted<T, U> {
    parents: Vec<Arc<dyn BaseSignal<T>>>,
    convert: Convert<T, U>,
    post_add: Option<PostAdd<U>>,
    listeners: Mutex<HashMap<ListenerId, Listener<T>>>,
}

impl<T: 'static, U: 'static> Adapted<T, U> {
    pub fn new<F>(parents: Vec<Arc<dyn BaseSignal<T>>>, convert: F) -> Self
    where F: Fn(&Listener<U>) -> Listener<T> + Send + Sync + 'static {
        Self { parents, convert: Box::new(convert), post_add: None, listeners: Mutex::new(HashMap::new()) }
    }

    pub fn with_post_add<P>(mut self, post_add: P) -> Self
    where P: Fn(&Listener<U>, &dyn Fn() -> bool) + Send + Sync + 'static {
        self.post_add = Some(Box::new(post_add));
        self
    }

    /// Removes every converted listener from the parents, once a root behind them has been cleared
    pub fn detach_on_clear(self: &Arc<Self>, hooks: &ClearHooks) { hooks.push_owned(self, Self::detach) }

    fn detach(&self) {
        let listeners = std::mem::take(&mut *self.listeners.lock().expect("adapted listeners lock poisoned"));
        for upstream in listeners.into_values() {
            for parent in &self.parents {
                parent.remove_key(Key::Listener(upstream.id()));
            }
        }
    }

    fn is_registered(&self, id: ListenerId) -> bool { self.listeners.lock().expect("adapted listeners lock poisoned").contains_key(&id) }

    #[cfg(test)]
    pub fn len(&self) -> usize { self.listeners.lock().expect("adapted listeners lock poisoned").len() }
}

impl<T: 'static, U: 'static> BaseSignal<U> for Adapted<T, U> {
    fn add_tagged(&self, listener: Listener<U>, _tags: &[Tag]) {
        let upstream = {
            let mut listeners = self.listeners.lock().expect("adapted listeners lock poisoned");
            if listeners.contains_key(&listener.id()) {
                return;
            }
            let upstream = (self.convert)(&listener);
            listeners.insert(listener.id(), upstream.clone());
            upstream
        };

        for parent in &self.parents {
            parent.add(upstream.clone());
        }

        if let Some(post_add) = &self.post_add {
            let id = listener.id();
            post_add(&listener, &|| self.is_registered(id));
        }
    }

    fn remove_key(&self, key: Key) {
        // tags never reach this layer, they are resolved by the Readable wrapping it
        let Key::Listener(id) = key else { return };
        let upstream = self.listeners.lock().expect("adapted listeners lock poisoned").remove(&id);
        if let Some(upstream) = upstream {
            for parent in &self.parents {
                parent.remove_key(Key::Listener(upstream.id()));
            }
        }
    }
}
