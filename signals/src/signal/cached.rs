use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    cache::Cache,
    listener::{Key, Listener},
    signal::{Readable, adapted::Adapted, read::forward},
};

struct CacheState<C> {
    cache: Mutex<C>,
    /// Cleared when the signal the cache hangs off is cleared. A dead cache never replays again.
    alive: AtomicBool,
}

impl<C> CacheState<C> {
    /// A cache whose `add` panicked (e.g. in a user grouping function) stays usable with whatever it holds
    fn cache(&self) -> MutexGuard<'_, C> { self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) }
}

/// A signal that replays what its cache holds to every listener added to it, then forwards live payloads.
///
/// The cache kind is part of the type, so signatures can demand e.g. a `Cached<T, ValueCache<T>>`.
/// Listeners added with [`add_fresh`](Readable::add_fresh), directly or through any derived signal, skip the replay.
pub struct Cached<T, C> {
    signal: Readable<T>,
    state: Arc<CacheState<C>>,
}

impl<T, C> Clone for Cached<T, C> {
    fn clone(&self) -> Self { Self { signal: self.signal.clone(), state: self.state.clone() } }
}

impl<T, C> std::fmt::Debug for Cached<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cached").field("signal", &self.signal).field("alive", &self.is_alive()).finish()
    }
}

impl<T, C> Cached<T, C> {
    /// Whether the cache still replays. False once the owning signal has been cleared.
    pub fn is_alive(&self) -> bool { self.state.alive.load(Ordering::SeqCst) }
}

impl<T, C> Cached<T, C>
where
    T: Clone + Send + 'static,
    C: Cache<T>,
{
    pub(crate) fn attach(source: &Readable<T>, cache: C) -> Self {
        let state = Arc::new(CacheState { cache: Mutex::new(cache), alive: AtomicBool::new(true) });
        let base = source.base().clone();

        let writer = {
            let state = state.clone();
            Listener::new(move |payload: &T| state.cache().add(payload.clone()))
        };
        let writer_id = writer.id();
        base.add(writer);

        {
            let state = state.clone();
            let base = Arc::downgrade(&base);
            source.hooks().push(move || {
                state.alive.store(false, Ordering::SeqCst);
                if let Some(base) = base.upgrade() {
                    base.remove_key(Key::Listener(writer_id));
                }
                tracing::debug!("cache detached by clear");
            });
        }
        tracing::debug!(writer = %writer_id, "cache attached");

        let replay = {
            let state = state.clone();
            move |listener: &Listener<T>, active: &dyn Fn() -> bool| {
                if listener.is_fresh() {
                    return;
                }
                for payload in snapshot(&state) {
                    // the listener may remove itself, or clear the signal, while being replayed to
                    if !state.alive.load(Ordering::SeqCst) || !active() {
                        break;
                    }
                    listener.call(&payload);
                }
            }
        };

        let adapted = Adapted::new(vec![base], forward).with_post_add(replay);

        Self { signal: Readable::from_adapted(adapted, source.hooks().clone()), state }
    }

    /// What a listener added right now would be replayed. Empty once the cache is dead.
    pub fn cached_payloads(&self) -> Vec<T> {
        if !self.is_alive() {
            return Vec::new();
        }
        snapshot(&self.state)
    }
}

/// Copies the cache contents out so no lock is held while listeners run
fn snapshot<T: Clone, C: Cache<T>>(state: &CacheState<C>) -> Vec<T> {
    let cache = state.cache();
    let mut payloads = Vec::new();
    cache.for_each(&mut |payload| payloads.push(payload.clone()));
    payloads
}

impl<T, C> Deref for Cached<T, C> {
    type Target = Readable<T>;

    fn deref(&self) -> &Self::Target { &self.signal }
}

impl<T, C> From<&Cached<T, C>> for Key {
    fn from(signal: &Cached<T, C>) -> Self { Key::from(&signal.signal) }
}

#[cfg(test)]
mod tests {
    use crate::{CollectionCache, Listener, Signal, ValueCache};
    use std::sync::{Arc, Mutex, MutexGuard};

    fn collect<T: Clone + Send + 'static>() -> (Listener<T>, Arc<Mutex<Vec<T>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let listener = {
            let seen = seen.clone();
            Listener::new(move |payload: &T| seen.lock().unwrap().push(payload.clone()))
        };
        (listener, seen)
    }

    #[test]
    fn test_last_value_replayed_before_live_payloads() {
        let signal = Signal::<&'static str>::new();
        let cached = signal.cache_last();
        for payload in ["a", "b", "c"] {
            signal.dispatch(payload);
        }

        let (listener, seen) = collect::<&'static str>();
        cached.add(listener);
        assert_eq!(*seen.lock().unwrap(), vec!["c"]);

        signal.dispatch("d");
        assert_eq!(*seen.lock().unwrap(), vec!["c", "d"]);
    }

    #[test]
    fn test_cache_writer_is_the_only_leftover_listener() {
        let signal = Signal::<()>::new();
        let cached = signal.cache(ValueCache::new());
        assert_eq!(signal.listener_count(), 1);

        let (listener, _) = collect::<()>();
        cached.add(listener.clone());
        assert_eq!(signal.listener_count(), 2);

        signal.dispatch(());
        cached.remove(&listener);
        assert_eq!(signal.listener_count(), 1);

        signal.clear();
        assert_eq!(signal.listener_count(), 0);
        assert!(!cached.is_alive());
    }

    #[test]
    fn test_cached_payloads_snapshot() {
        let signal = Signal::<u8>::new();
        let cached = signal.cache(CollectionCache::new());
        signal.dispatch(1);
        signal.dispatch(2);
        assert_eq!(cached.cached_payloads(), vec![1, 2]);

        signal.clear();
        assert!(cached.cached_payloads().is_empty());
    }
}
