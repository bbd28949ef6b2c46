use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// Listener ids and tags share one counter so a Key can never be ambiguous
static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

fn next_id() -> usize { NEXT_ID.fetch_add(1, Ordering::Relaxed) }

/// Identity of a listener. Every clone of a [`Listener`] carries the same id.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl ListenerId {
    pub(crate) fn next() -> Self { Self(next_id()) }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "L{}", self.0) }
}

/// An opaque secondary key. Listeners registered with a tag can be removed in bulk by removing the tag.
///
/// Tags are compared by identity, never by value: two calls to [`Tag::new`] always produce distinct tags.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tag(usize);

impl Tag {
    pub fn new() -> Self { Self(next_id()) }
}

impl Default for Tag {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "T{}", self.0) }
}

/// Whether cache replay should reach a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Receives replayed payloads from any cache upstream
    #[default]
    Plain,
    /// Only receives live dispatches
    Fresh,
}

/// A callback subscribed to a signal.
///
/// Cloning a listener is cheap and keeps its identity, so a clone can later be used to remove it.
pub struct Listener<T> {
    id: ListenerId,
    freshness: Freshness,
    callback: Arc<dyn Fn(&T) + Send + Sync + 'static>,
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self { Self { id: self.id, freshness: self.freshness, callback: self.callback.clone() } }
}

impl<T> std::fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).field("freshness", &self.freshness).finish()
    }
}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}
impl<T> Eq for Listener<T> {}

impl<T> Listener<T> {
    pub fn new<F>(callback: F) -> Self
    where F: Fn(&T) + Send + Sync + 'static {
        Self { id: ListenerId::next(), freshness: Freshness::Plain, callback: Arc::new(callback) }
    }

    /// Builds a listener with a pre-allocated id, for callbacks that need to refer to themselves
    pub(crate) fn with_id<F>(id: ListenerId, freshness: Freshness, callback: F) -> Self
    where F: Fn(&T) + Send + Sync + 'static {
        Self { id, freshness, callback: Arc::new(callback) }
    }

    pub fn id(&self) -> ListenerId { self.id }

    pub fn freshness(&self) -> Freshness { self.freshness }

    pub fn is_fresh(&self) -> bool { self.freshness == Freshness::Fresh }

    /// The same listener (same identity) marked as fresh
    pub fn into_fresh(mut self) -> Self {
        self.freshness = Freshness::Fresh;
        self
    }

    /// Creates a new listener with its own identity that inherits this listener's freshness.
    ///
    /// Every derivation adapter goes through here so that a fresh listener stays fresh however
    /// deep the chain of filters/maps above it is.
    pub fn adapt<U, F>(&self, callback: F) -> Listener<U>
    where F: Fn(&U) + Send + Sync + 'static {
        Listener { id: ListenerId::next(), freshness: self.freshness, callback: Arc::new(callback) }
    }

    pub fn call(&self, payload: &T) { (self.callback)(payload) }
}

/// Conversion into a [`Listener`]
pub trait IntoListener<T> {
    fn into_listener(self) -> Listener<T>;
}

impl<T> IntoListener<T> for Listener<T> {
    fn into_listener(self) -> Listener<T> { self }
}

impl<T> IntoListener<T> for &Listener<T> {
    fn into_listener(self) -> Listener<T> { self.clone() }
}

impl<F, T> IntoListener<T> for F
where F: Fn(&T) + Send + Sync + 'static
{
    fn into_listener(self) -> Listener<T> { Listener::new(self) }
}

impl<T> IntoListener<T> for std::sync::mpsc::Sender<T>
where T: Clone + Send + 'static
{
    fn into_listener(self) -> Listener<T> {
        Listener::new(move |payload: &T| {
            let _ = self.send(payload.clone()); // receiver may be gone
        })
    }
}

#[cfg(feature = "tokio")]
impl<T> IntoListener<T> for tokio::sync::mpsc::UnboundedSender<T>
where T: Clone + Send + 'static
{
    fn into_listener(self) -> Listener<T> {
        Listener::new(move |payload: &T| {
            let _ = self.send(payload.clone()); // receiver may be gone
        })
    }
}

/// What `remove` accepts: either a listener identity or a tag
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Key {
    Listener(ListenerId),
    Tag(Tag),
}

impl From<ListenerId> for Key {
    fn from(id: ListenerId) -> Self { Key::Listener(id) }
}

impl<T> From<&Listener<T>> for Key {
    fn from(listener: &Listener<T>) -> Self { Key::Listener(listener.id) }
}

impl From<Tag> for Key {
    fn from(tag: Tag) -> Self { Key::Tag(tag) }
}

impl From<&Tag> for Key {
    fn from(tag: &Tag) -> Self { Key::Tag(*tag) }
}
