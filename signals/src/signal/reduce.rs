use std::sync::{Arc, Mutex};

use crate::{
    broadcast::{Broadcast, Fallback},
    listener::{Key, Listener, ListenerId, Tag},
    signal::Readable,
    traits::BaseSignal,
};

type Accumulator<T, U> = dyn Fn(U, &T) -> U + Send + Sync + 'static;

/// The listener set of a reduced signal.
///
/// One link listener on the parent owns the accumulation and fans the new value out to the reduced signal's listeners,
/// so the accumulator runs once per payload however many listeners there are. The link is registered with the first
/// listener and removed with the last, inheriting the freshness of the listener that brought it in.
struct Reduced<T, U> {
    parent: Arc<dyn BaseSignal<T>>,
    downstream: Arc<Broadcast<U>>,
    link: Mutex<Option<ListenerId>>,
    accumulated: Arc<Mutex<U>>,
    accumulator: Arc<Accumulator<T, U>>,
    initial: Mutex<U>,
}

impl<T: 'static, U: Clone + Send + 'static> Reduced<T, U> {
    fn link_listener(&self, first: &Listener<U>) -> Listener<T> {
        let downstream = self.downstream.clone();
        let accumulated = self.accumulated.clone();
        let accumulator = self.accumulator.clone();
        first.adapt(move |payload: &T| {
            // not held across the accumulator or the fan-out, both may re-enter
            let current = accumulated.lock().expect("accumulator lock poisoned").clone();
            let next = accumulator(current, payload);
            *accumulated.lock().expect("accumulator lock poisoned") = next.clone();
            downstream.send(&next);
        })
    }

    fn unlink(&self) {
        let link = self.link.lock().expect("reduce link lock poisoned").take();
        if let Some(id) = link {
            self.parent.remove_key(Key::Listener(id));
        }
    }

    /// Forgets listeners, link and accumulated value once the source has been cleared
    fn reset(&self) {
        self.unlink();
        self.downstream.clear();
        let initial = self.initial.lock().expect("accumulator lock poisoned").clone();
        *self.accumulated.lock().expect("accumulator lock poisoned") = initial;
    }
}

impl<T: 'static, U: Clone + Send + 'static> BaseSignal<U> for Reduced<T, U> {
    fn add_tagged(&self, listener: Listener<U>, _tags: &[Tag]) {
        self.downstream.insert(listener.clone());

        let link = {
            let mut link = self.link.lock().expect("reduce link lock poisoned");
            if link.is_some() {
                return;
            }
            let upstream = self.link_listener(&listener);
            *link = Some(upstream.id());
            upstream
        };
        self.parent.add(link);
    }

    fn remove_key(&self, key: Key) {
        let Key::Listener(id) = key else { return };
        self.downstream.remove(id);
        if self.downstream.len() == 0 {
            self.unlink();
        }
    }
}

/// Builds a signal carrying the running accumulation of `source`
pub(crate) fn reduce<T, U, F>(source: &Readable<T>, accumulator: F, initial: U) -> Readable<U>
where
    T: 'static,
    U: Clone + Send + 'static,
    F: Fn(U, &T) -> U + Send + Sync + 'static,
{
    let reduced = Arc::new(Reduced {
        parent: source.base().clone(),
        downstream: Arc::new(Broadcast::new(Fallback::Silent)),
        link: Mutex::new(None),
        accumulated: Arc::new(Mutex::new(initial.clone())),
        accumulator: Arc::new(accumulator),
        initial: Mutex::new(initial),
    });
    source.hooks().push_owned(&reduced, |reduced: &Reduced<T, U>| reduced.reset());

    Readable::from_base(reduced, source.hooks().clone())
}
