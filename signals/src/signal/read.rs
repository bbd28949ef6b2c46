use std::sync::{Arc, Mutex};

use crate::{
    cache::{Cache, ValueCache},
    hooks::ClearHooks,
    listener::{IntoListener, Key, Listener, ListenerId, Tag},
    signal::{Cached, Signal, adapted::Adapted, reduce},
    tag_map::TagMap,
    traits::{AsTag, BaseSignal},
};

struct Inner<T> {
    /// Where listeners actually end up: a root broadcast or an adapter over a parent
    base: Arc<dyn BaseSignal<T>>,
    tag_map: Arc<Mutex<TagMap>>,
    /// Shared with the writable signal at the root of the derivation chain
    hooks: ClearHooks,
    tag: Tag,
}

/// A signal that can be listened to but not dispatched on.
///
/// Every operator (`filter`, `map`, `cache`, ...) returns a new signal with its own listeners, which forwards through
/// an adapter registered on this signal's underlying listener set. Removing a listener from a derived signal only ever
/// removes that signal's own adapter upstream.
///
/// Cloning a `Readable` shares the same listeners.
pub struct Readable<T>(Arc<Inner<T>>);

impl<T> Clone for Readable<T> {
    fn clone(&self) -> Self { Self(Arc::clone(&self.0)) }
}

impl<T> std::fmt::Debug for Readable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Readable").field("tag", &self.0.tag).finish() }
}

impl<T: 'static> Readable<T> {
    pub(crate) fn from_base(base: Arc<dyn BaseSignal<T>>, hooks: ClearHooks) -> Self {
        let tag_map = Arc::new(Mutex::new(TagMap::new()));
        // the registrations behind these tags are gone after a clear
        hooks.push_owned(&tag_map, |tag_map: &Mutex<TagMap>| tag_map.lock().expect("tag map lock poisoned").clear());
        Self(Arc::new(Inner { base, tag_map, hooks, tag: Tag::new() }))
    }

    /// A signal over `adapted`, which lets go of its upstream listeners when a root behind `hooks` is cleared
    pub(crate) fn from_adapted<P: 'static>(adapted: Adapted<P, T>, hooks: ClearHooks) -> Self {
        let adapted = Arc::new(adapted);
        adapted.detach_on_clear(&hooks);
        Self::from_base(adapted, hooks)
    }

    pub(crate) fn base(&self) -> &Arc<dyn BaseSignal<T>> { &self.0.base }

    pub(crate) fn hooks(&self) -> &ClearHooks { &self.0.hooks }

    /// This signal's identity when used as a tag
    pub fn tag(&self) -> Tag { self.0.tag }

    /// Registers a listener. Adding the same listener twice is a no-op.
    pub fn add(&self, listener: impl IntoListener<T>) { self.register(listener.into_listener(), []) }

    /// Registers a listener that can later also be removed by removing any of `tags`
    pub fn add_tagged(&self, listener: impl IntoListener<T>, tags: impl IntoIterator<Item = Tag>) { self.register(listener.into_listener(), tags) }

    /// Removes a listener by identity, or every listener registered under a tag
    pub fn remove(&self, key: impl Into<Key>) { self.unregister(key.into()) }

    /// Registers a listener that removes itself the first time it is called
    pub fn add_once(&self, listener: impl IntoListener<T>) { self.add_once_tagged(listener, []) }

    pub fn add_once_tagged(&self, listener: impl IntoListener<T>, tags: impl IntoIterator<Item = Tag>) {
        let listener = listener.into_listener();

        // same set semantics as add: a listener that already resolves to a registration is not added again
        if !self.0.tag_map.lock().expect("tag map lock poisoned").get_listeners(Key::from(&listener)).is_empty() {
            return;
        }

        let once_id = ListenerId::next();
        let base = Arc::downgrade(&self.0.base);
        let tag_map = Arc::downgrade(&self.0.tag_map);
        let original = listener.clone();
        let once = Listener::with_id(once_id, listener.freshness(), move |payload: &T| {
            if let Some(base) = base.upgrade() {
                base.remove_key(Key::Listener(once_id));
            }
            if let Some(tag_map) = tag_map.upgrade() {
                tag_map.lock().expect("tag map lock poisoned").clear_listener(once_id);
            }
            original.call(payload);
        });

        // the wrapped listener doubles as a tag so remove(&listener) finds the one-shot wrapper
        let keys = std::iter::once(Key::from(&listener)).chain(tags.into_iter().map(Key::Tag)).collect::<Vec<_>>();
        self.0.tag_map.lock().expect("tag map lock poisoned").set_listeners(once_id, keys);
        self.0.base.add(once);
    }

    /// Registers a listener that never receives cache replay, only live dispatches
    pub fn add_fresh(&self, listener: impl IntoListener<T>) { self.add_fresh_tagged(listener, []) }

    pub fn add_fresh_tagged(&self, listener: impl IntoListener<T>, tags: impl IntoIterator<Item = Tag>) {
        self.register(listener.into_listener().into_fresh(), tags)
    }

    fn register(&self, listener: Listener<T>, tags: impl IntoIterator<Item = Tag>) {
        self.0.tag_map.lock().expect("tag map lock poisoned").set_listeners(listener.id(), tags.into_iter().map(Key::Tag));
        self.0.base.add(listener);
    }

    fn unregister(&self, key: Key) {
        let tagged = self.0.tag_map.lock().expect("tag map lock poisoned").get_listeners(key);
        for id in tagged {
            self.0.base.remove_key(Key::Listener(id));
            self.0.tag_map.lock().expect("tag map lock poisoned").clear_listener(id);
        }
        self.0.base.remove_key(key);
        if let Key::Listener(id) = key {
            self.0.tag_map.lock().expect("tag map lock poisoned").clear_listener(id);
        }
    }

    /// A signal whose listeners are built from listeners added to it by `convert`
    fn derive<U, F>(&self, convert: F) -> Readable<U>
    where
        U: 'static,
        F: Fn(&Listener<U>) -> Listener<T> + Send + Sync + 'static,
    {
        Readable::from_adapted(Adapted::new(vec![self.0.base.clone()], convert), self.0.hooks.clone())
    }

    /// Forwards every payload to `child` (or a new signal), and returns it.
    ///
    /// The forwarding listener is tagged with the child, so `parent.remove(&child)` unlinks it. Clearing the child
    /// releases the child's own listeners and hooks but leaves the link on this signal in place.
    pub fn chain(&self, child: Option<Signal<T>>) -> Signal<T>
    where T: Clone {
        let child = child.unwrap_or_default();
        let target = child.clone();
        self.add_tagged(move |payload: &T| target.dispatch(payload.clone()), [child.tag()]);
        child
    }

    /// Only forwards payloads matching `predicate`; the rest are dropped
    pub fn filter<F>(&self, predicate: F) -> Readable<T>
    where F: Fn(&T) -> bool + Send + Sync + 'static {
        let predicate = Arc::new(predicate);
        self.derive(move |listener: &Listener<T>| {
            let inner = listener.clone();
            let predicate = predicate.clone();
            listener.adapt(move |payload: &T| {
                if predicate(payload) {
                    inner.call(payload);
                }
            })
        })
    }

    /// Forwards `transform(payload)`
    pub fn map<U, F>(&self, transform: F) -> Readable<U>
    where
        U: 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let transform = Arc::new(transform);
        self.derive(move |listener: &Listener<U>| {
            let inner = listener.clone();
            let transform = transform.clone();
            listener.adapt(move |payload: &T| inner.call(&transform(payload)))
        })
    }

    /// Calls `peeker` with every payload before forwarding it unchanged.
    ///
    /// Payloads are not copied, so a peeker mutating a payload through interior mutability is visible downstream.
    pub fn peek<F>(&self, peeker: F) -> Readable<T>
    where F: Fn(&T) + Send + Sync + 'static {
        let peeker = Arc::new(peeker);
        self.derive(move |listener: &Listener<T>| {
            let inner = listener.clone();
            let peeker = peeker.clone();
            listener.adapt(move |payload: &T| {
                peeker(payload);
                inner.call(payload);
            })
        })
    }

    /// A separate view of this signal with its own listeners
    pub fn read_only(&self) -> Readable<T> { self.derive(forward) }

    /// Forwards a running accumulation of every payload, starting from `initial`.
    ///
    /// There is one accumulated value per reduced signal, not per listener, and every listener sees the same
    /// accumulated value. Payloads only accumulate while the reduced signal has listeners; clearing the source starts
    /// over from `initial`.
    pub fn reduce<U, F>(&self, accumulator: F, initial: U) -> Readable<U>
    where
        U: Clone + Send + 'static,
        F: Fn(U, &T) -> U + Send + Sync + 'static,
    {
        reduce::reduce(self, accumulator, initial)
    }

    /// Dispatches whenever this signal or any of `others` dispatches.
    ///
    /// Clearing any of the merged signals detaches every listener of the merged signal and kills caches attached to it.
    pub fn merge<'a>(&self, others: impl IntoIterator<Item = &'a Readable<T>>) -> Readable<T> {
        let mut signals = vec![self.clone()];
        signals.extend(others.into_iter().cloned());
        merge_all(signals)
    }

    /// Attaches `cache`: from now on every payload is written to it, and listeners added to the returned signal first
    /// receive what the cache holds.
    pub fn cache<C>(&self, cache: C) -> Cached<T, C>
    where
        T: Clone + Send,
        C: Cache<T>,
    {
        Cached::attach(self, cache)
    }

    /// [`cache`](Self::cache) with a cache holding only the latest payload
    pub fn cache_last(&self) -> Cached<T, ValueCache<T>>
    where T: Clone + Send {
        self.cache(ValueCache::new())
    }
}

/// Merges `signals` into one signal that dispatches whenever any of them does
pub fn merge<'a, T: 'static>(signals: impl IntoIterator<Item = &'a Readable<T>>) -> Readable<T> {
    merge_all(signals.into_iter().cloned().collect())
}

fn merge_all<T: 'static>(signals: Vec<Readable<T>>) -> Readable<T> {
    let parents = signals.iter().map(|signal| signal.0.base.clone()).collect();
    let hooks = ClearHooks::merged(signals.iter().map(|signal| &signal.0.hooks));
    Readable::from_adapted(Adapted::new(parents, forward), hooks)
}

pub(crate) fn forward<T: 'static>(listener: &Listener<T>) -> Listener<T> {
    let inner = listener.clone();
    listener.adapt(move |payload: &T| inner.call(payload))
}

impl<T: 'static> BaseSignal<T> for Readable<T> {
    fn add_tagged(&self, listener: Listener<T>, tags: &[Tag]) { self.register(listener, tags.iter().copied()) }

    fn remove_key(&self, key: Key) { self.unregister(key) }
}

impl<T> AsTag for Readable<T> {
    fn tag(&self) -> Tag { self.0.tag }
}

impl<T> From<&Readable<T>> for Key {
    fn from(signal: &Readable<T>) -> Self { Key::Tag(signal.0.tag) }
}
