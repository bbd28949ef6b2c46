use indexmap::IndexMap;
use std::collections::VecDeque;
use std::hash::Hash;

use crate::error::{Result, SignalError};

/// Replay storage for late subscribers of a [`Cached`](crate::Cached) signal.
///
/// `for_each` visits stored payloads in the order they should be replayed, and visits nothing when empty.
pub trait Cache<T>: Send + 'static {
    fn add(&mut self, payload: T);
    fn for_each(&self, callback: &mut dyn FnMut(&T));
}

/// Holds exactly one payload. Late listeners get the very last payload.
#[derive(Debug, Clone)]
pub struct ValueCache<T>(Option<T>);

impl<T> Default for ValueCache<T> {
    fn default() -> Self { Self(None) }
}

impl<T> ValueCache<T> {
    pub fn new() -> Self { Self::default() }

    pub fn clear(&mut self) { self.0 = None; }

    pub fn len(&self) -> usize { self.0.iter().count() }

    pub fn is_empty(&self) -> bool { self.0.is_none() }
}

impl<T: Send + 'static> Cache<T> for ValueCache<T> {
    fn add(&mut self, payload: T) { self.0 = Some(payload); }

    fn for_each(&self, callback: &mut dyn FnMut(&T)) {
        if let Some(payload) = &self.0 {
            callback(payload);
        }
    }
}

/// Holds every payload. Late listeners get all previous payloads in dispatch order.
#[derive(Debug, Clone)]
pub struct CollectionCache<T>(Vec<T>);

impl<T> Default for CollectionCache<T> {
    fn default() -> Self { Self(Vec::new()) }
}

impl<T> CollectionCache<T> {
    pub fn new() -> Self { Self::default() }

    /// A collection cache that only keeps the latest `capacity` payloads
    pub fn with_capacity(capacity: usize) -> Result<CapacityCache<T>> { CapacityCache::new(capacity) }

    pub fn clear(&mut self) { self.0.clear(); }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<T: Send + 'static> Cache<T> for CollectionCache<T> {
    fn add(&mut self, payload: T) { self.0.push(payload); }

    fn for_each(&self, callback: &mut dyn FnMut(&T)) {
        for payload in &self.0 {
            callback(payload);
        }
    }
}

/// Holds payloads up to a capacity, evicting the oldest first.
/// Late listeners get at most the `capacity` latest payloads.
#[derive(Debug, Clone)]
pub struct CapacityCache<T> {
    payloads: VecDeque<T>,
    capacity: usize,
}

impl<T> CapacityCache<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            tracing::warn!("refusing to construct a capacity cache with capacity 0");
            return Err(SignalError::InvalidArgument(format!("constructing a cache with a capacity of {capacity} makes no sense")));
        }
        Ok(Self { payloads: VecDeque::with_capacity(capacity), capacity })
    }

    pub fn capacity(&self) -> usize { self.capacity }

    pub fn clear(&mut self) { self.payloads.clear(); }

    pub fn len(&self) -> usize { self.payloads.len() }

    pub fn is_empty(&self) -> bool { self.payloads.is_empty() }
}

impl<T: Send + 'static> Cache<T> for CapacityCache<T> {
    fn add(&mut self, payload: T) {
        if self.payloads.len() == self.capacity {
            self.payloads.pop_front();
        }
        self.payloads.push_back(payload);
    }

    fn for_each(&self, callback: &mut dyn FnMut(&T)) {
        for payload in &self.payloads {
            callback(payload);
        }
    }
}

/// Holds the latest payload of each group, as computed by a grouping function.
///
/// Groups replay in the order they were first seen. A newer payload for a known group replaces the stored one in place.
pub struct GroupingCache<T, G> {
    payloads: IndexMap<G, T>,
    group_of: Box<dyn Fn(&T) -> G + Send + 'static>,
}

impl<T, G> GroupingCache<T, G>
where G: Hash + Eq
{
    pub fn new<F>(group_of: F) -> Self
    where F: Fn(&T) -> G + Send + 'static {
        Self { payloads: IndexMap::new(), group_of: Box::new(group_of) }
    }

    pub fn clear(&mut self) { self.payloads.clear(); }

    pub fn len(&self) -> usize { self.payloads.len() }

    pub fn is_empty(&self) -> bool { self.payloads.is_empty() }
}

impl<T, G> std::fmt::Debug for GroupingCache<T, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("GroupingCache").field("groups", &self.payloads.len()).finish() }
}

impl<T, G> Cache<T> for GroupingCache<T, G>
where
    T: Send + 'static,
    G: Hash + Eq + Send + 'static,
{
    fn add(&mut self, payload: T) {
        let group = (self.group_of)(&payload);
        // IndexMap::insert keeps the original position of an existing key
        self.payloads.insert(group, payload);
    }

    fn for_each(&self, callback: &mut dyn FnMut(&T)) {
        for payload in self.payloads.values() {
            callback(payload);
        }
    }
}
