use crate::listener::{Key, Listener, Tag};

/// The minimal add/remove contract shared by every signal.
///
/// Dyn safe: derived signals hold their parent as `Arc<dyn BaseSignal<T>>`.
pub trait BaseSignal<T>: Send + Sync {
    /// Registers `listener` and associates it with `tags`. Adding an already registered listener is a no-op
    /// for dispatch purposes (its new tags are still recorded).
    fn add_tagged(&self, listener: Listener<T>, tags: &[Tag]);

    /// Removes every listener matching `key` (by identity, or registered under it as a tag).
    /// Removing something that is not registered does nothing.
    fn remove_key(&self, key: Key);

    fn add(&self, listener: Listener<T>) { self.add_tagged(listener, &[]) }

    fn remove(&self, key: impl Into<Key>)
    where Self: Sized {
        self.remove_key(key.into())
    }
}

impl<T, S> BaseSignal<T> for std::sync::Arc<S>
where S: BaseSignal<T> + ?Sized
{
    fn add_tagged(&self, listener: Listener<T>, tags: &[Tag]) { (**self).add_tagged(listener, tags) }

    fn remove_key(&self, key: Key) { (**self).remove_key(key) }
}

/// Anything that can stand in for a tag. Signals are tags too, which is how `chain` links are removed.
pub trait AsTag {
    fn tag(&self) -> Tag;
}

impl AsTag for Tag {
    fn tag(&self) -> Tag { *self }
}
