use relay_signals::*;
mod common;
use common::watcher;
use std::sync::{Arc, Mutex};

// at least 4 items: some tests split them
const TEST_VALUES: [f64; 8] = [0.0, 2.0, 4.0, f64::INFINITY, 1.0, -4.0, 49.0, 0.0];

/// Replays a fixed list, ignores writes
struct FixedCache<T>(Vec<T>);

impl<T: Send + 'static> Cache<T> for FixedCache<T> {
    fn add(&mut self, _payload: T) {}

    fn for_each(&self, callback: &mut dyn FnMut(&T)) {
        for payload in &self.0 {
            callback(payload);
        }
    }
}

/// Records writes, replays nothing
struct RecordingCache(Arc<Mutex<Vec<f64>>>);

impl Cache<f64> for RecordingCache {
    fn add(&mut self, payload: f64) { self.0.lock().unwrap().push(payload); }

    fn for_each(&self, _callback: &mut dyn FnMut(&f64)) {}
}

#[test]
fn test_dispatch_writes_to_the_cache() {
    let signal = Signal::<f64>::new();
    let written = Arc::new(Mutex::new(Vec::new()));
    let _cached = signal.cache(RecordingCache(written.clone()));

    for value in TEST_VALUES {
        signal.dispatch(value);
    }
    assert_eq!(*written.lock().unwrap(), TEST_VALUES);
}

#[test]
fn test_add_replays_what_the_cache_provides() {
    let signal = Signal::<f64>::new();
    let cached = signal.cache(FixedCache(TEST_VALUES.to_vec()));
    let (listener, check) = watcher();

    cached.add(listener);
    assert_eq!(check(), TEST_VALUES);
}

#[test]
fn test_add_once_replays_only_the_first_payload() {
    let signal = Signal::<f64>::new();
    let cached = signal.cache(FixedCache(TEST_VALUES.to_vec()));
    let (listener, check) = watcher();

    cached.add_once(listener);
    assert_eq!(check(), TEST_VALUES[..1]);
    signal.dispatch(1.0);
    assert_eq!(check(), [] as [f64; 0]);
}

#[test]
fn test_replayed_then_live_payloads() {
    let signal = Signal::<f64>::new();
    let cached = signal.cache(FixedCache(TEST_VALUES[..2].to_vec()));
    let (listener, check) = watcher();

    cached.add(listener);
    for value in &TEST_VALUES[2..] {
        signal.dispatch(*value);
    }
    assert_eq!(check(), TEST_VALUES);
}

#[test]
fn test_collection_cache_replay_and_live_mix() {
    let signal = Signal::<f64>::new();
    let cached = signal.cache(CollectionCache::new());
    let (listener, check) = watcher();

    for value in &TEST_VALUES[..2] {
        signal.dispatch(*value);
    }
    cached.add(listener);
    for value in &TEST_VALUES[2..] {
        signal.dispatch(*value);
    }
    assert_eq!(check(), TEST_VALUES);
}

#[test]
fn test_removing_during_replay() {
    let signal = Signal::<f64>::new();
    let cached = signal.cache(FixedCache(TEST_VALUES.to_vec()));
    let received = Arc::new(Mutex::new(Vec::new()));
    let tag = Tag::new();

    cached.add_tagged(
        {
            let received = received.clone();
            let cached = cached.clone();
            move |payload: &f64| {
                let mut received = received.lock().unwrap();
                received.push(*payload);
                if received.len() == 2 {
                    cached.remove(tag);
                }
            }
        },
        [tag],
    );
    assert_eq!(*received.lock().unwrap(), TEST_VALUES[..2]);
}

#[test]
fn test_clearing_during_replay() {
    let signal = Signal::<i32>::new();
    let cached = signal.cache(CollectionCache::new());
    for x in [1, 2, 3] {
        signal.dispatch(x);
    }

    let received = Arc::new(Mutex::new(Vec::new()));
    cached.add({
        let received = received.clone();
        let signal = signal.clone();
        move |payload: &i32| {
            received.lock().unwrap().push(*payload);
            signal.clear();
        }
    });
    assert_eq!(*received.lock().unwrap(), [1]);
    assert!(!cached.is_alive());
}

#[test]
fn test_derived_from_cached_receives_the_cache() {
    let signal = Signal::<i32>::new();
    let cached = signal.cache(FixedCache(vec![1, 2, 3]));
    let (listener, check) = watcher();

    cached.map(|x| x.to_string()).add(listener);
    assert_eq!(check(), ["1", "2", "3"]);
}

#[test]
fn test_last_value_cache() {
    let signal = Signal::<char>::new();
    let cached = signal.cache_last();
    for payload in ['a', 'b', 'c'] {
        signal.dispatch(payload);
    }

    let (listener, check) = watcher();
    cached.add(listener);
    assert_eq!(check(), ['c']);
    signal.dispatch('d');
    assert_eq!(check(), ['d']);
}

#[test]
fn test_empty_cache_replays_nothing() {
    let signal = Signal::<Option<i32>>::new();
    let (listener, check) = watcher();
    signal.cache(ValueCache::new()).add(listener.clone());
    assert_eq!(check(), [] as [Option<i32>; 0]);

    // a dispatched None is a payload like any other
    let cached = signal.cache_last();
    signal.dispatch(None);
    cached.add(listener);
    assert_eq!(check(), [None, None]);
}

#[test]
fn test_no_replay_after_clear() {
    let signal = Signal::<i32>::new();
    let cached = signal.cache(CollectionCache::new());
    let (too_late, check) = watcher();

    for x in [1, 2, 3, 4, 5] {
        signal.dispatch(x);
    }
    signal.clear();

    cached.add(too_late);
    assert_eq!(check(), [] as [i32; 0]);
}

#[test]
fn test_new_caches_after_clear() {
    let signal = Signal::<i32>::new();
    signal.clear();

    let cached = signal.cache(CollectionCache::new());
    for x in [6, 7, 8, 9, 0] {
        signal.dispatch(x);
    }
    let (late, check) = watcher();
    cached.map(|x| x + 10).add(late);
    assert_eq!(check(), [16, 17, 18, 19, 10]);
}

#[test]
fn test_capacity_cache_evicts_oldest() {
    let signal = Signal::<&'static str>::new();
    let cached = signal.cache(CollectionCache::with_capacity(4).unwrap());
    for payload in ["1", "2", "3", "4", "5", "6", "7", "8", "9", "a"] {
        signal.dispatch(payload);
    }

    let (listener, check) = watcher();
    cached.add(listener);
    assert_eq!(check(), ["7", "8", "9", "a"]);
}

#[test]
fn test_capacity_cache_below_capacity() {
    let payloads = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "a"];
    let signal = Signal::<&'static str>::new();
    let cached = signal.cache(CapacityCache::new(payloads.len() + 1).unwrap());
    for payload in payloads {
        signal.dispatch(payload);
    }

    let (listener, check) = watcher();
    cached.add(listener);
    assert_eq!(check(), payloads);
}

#[test]
fn test_zero_capacity_is_rejected() {
    assert!(matches!(CollectionCache::<i32>::with_capacity(0), Err(SignalError::InvalidArgument(_))));
}

#[derive(Debug, Clone, PartialEq)]
struct Light {
    kind: &'static str,
    on: bool,
}

fn light(kind: &'static str, on: bool) -> Light { Light { kind, on } }

#[test]
fn test_grouping_cache_keeps_latest_per_group() {
    let signal = Signal::<Light>::new();
    let cached = signal.cache(GroupingCache::new(|light: &Light| light.kind));
    for payload in [
        light("red", false),
        light("blue", false),
        light("red", true),
        light("blue", true),
        light("blue", false),
        light("yellow", false),
    ] {
        signal.dispatch(payload);
    }

    let (listener, check) = watcher();
    cached.add(listener);
    assert_eq!(check(), [light("red", true), light("blue", false), light("yellow", false)]);
}

#[test]
fn test_fresh_listeners_skip_replay_through_derivations() {
    let signal = Signal::<i32>::new();
    let cached = signal.cache(CollectionCache::new());
    for x in [1, 2, 3] {
        signal.dispatch(x);
    }

    let derived = cached.filter(|x| x % 2 == 1).map(|x| x * 10).peek(|_| {});
    let (fresh, check_fresh) = watcher();
    let (plain, check_plain) = watcher();

    derived.add_fresh(fresh);
    derived.add(plain);
    assert_eq!(check_fresh(), [] as [i32; 0]);
    assert_eq!(check_plain(), [10, 30]);

    signal.dispatch(5);
    signal.dispatch(6);
    assert_eq!(check_fresh(), [50]);
    assert_eq!(check_plain(), [50]);
}

#[test]
fn test_fresh_listener_directly_on_cached() {
    let signal = Signal::<i32>::new();
    let cached = signal.cache_last();
    signal.dispatch(1);

    let (fresh, check) = watcher();
    cached.add_fresh(fresh.clone());
    assert_eq!(check(), [] as [i32; 0]);
    signal.dispatch(2);
    assert_eq!(check(), [2]);

    cached.remove(&fresh);
    signal.dispatch(3);
    assert_eq!(check(), [] as [i32; 0]);
}

#[test]
fn test_cache_on_merged_signal_dies_with_any_input() {
    let a = Signal::<i32>::new();
    let b = Signal::<i32>::new();
    let cached = merge([&a.readable(), &b.readable()]).cache(CollectionCache::new());
    a.dispatch(1);
    b.dispatch(2);
    assert_eq!(cached.cached_payloads(), [1, 2]);

    b.clear();
    assert!(!cached.is_alive());
    assert_eq!(a.listener_count(), 0);

    let (listener, check) = watcher();
    cached.add(listener);
    assert_eq!(check(), [] as [i32; 0]);
    a.dispatch(3);
    assert_eq!(check(), [3]);
}

#[test]
fn test_panicking_grouping_function_does_not_poison_the_cache() {
    let signal = Signal::<i32>::new();
    let cached = signal.cache(GroupingCache::new(|x: &i32| {
        assert!(*x >= 0, "negative payload");
        *x % 2
    }));

    signal.dispatch(1);
    let dispatched = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| signal.dispatch(-1)));
    assert!(dispatched.is_err());
    signal.dispatch(2);
    signal.dispatch(3);

    let (listener, check) = watcher();
    cached.add(listener);
    assert_eq!(check(), [3, 2]);
}
