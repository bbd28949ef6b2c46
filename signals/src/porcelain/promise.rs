use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::{
    error::PromiseError,
    listener::{Key, Listener, ListenerId},
    signal::Readable,
    traits::BaseSignal,
};

/// Settles with the first payload of a resolve signal, or fails with the first payload of a reject signal.
///
/// Both settlement listeners are removed as soon as either signal fires, so a settled promise leaves no listener
/// behind. Dropping an unsettled promise removes them too. The promise is ready as soon as the triggering `dispatch`
/// returns.
#[must_use = "a promise unsubscribes when dropped"]
pub struct Promise<T, R = ()> {
    receiver: oneshot::Receiver<Result<T, R>>,
    links: SharedLinks<T, R>,
}

impl<T, R> std::fmt::Debug for Promise<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Promise").finish_non_exhaustive() }
}

impl<T, R> Future for Promise<T, R> {
    type Output = Result<T, PromiseError<R>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(Ok(payload))) => Poll::Ready(Ok(payload)),
            Poll::Ready(Ok(Err(reason))) => Poll::Ready(Err(PromiseError::Rejected(reason))),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PromiseError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, R> Drop for Promise<T, R> {
    fn drop(&mut self) { unlink(&self.links) }
}

/// The settlement listeners and where they are registered. Taken exactly once, by settlement or by dropping the promise.
struct Links<T, R> {
    resolve: (Arc<dyn BaseSignal<T>>, ListenerId),
    reject: Option<(Arc<dyn BaseSignal<R>>, ListenerId)>,
}

type SharedLinks<T, R> = Arc<Mutex<Option<Links<T, R>>>>;

fn unlink<T, R>(links: &SharedLinks<T, R>) {
    let links = links.lock().expect("promise links lock poisoned").take();
    if let Some(Links { resolve: (signal, id), reject }) = links {
        signal.remove_key(Key::Listener(id));
        if let Some((signal, id)) = reject {
            signal.remove_key(Key::Listener(id));
        }
    }
}

/// Owned by both settlement listeners. The sender goes to whichever fires first.
struct Settlement<T, R> {
    sender: Mutex<Option<oneshot::Sender<Result<T, R>>>>,
    links: SharedLinks<T, R>,
}

impl<T, R> Settlement<T, R> {
    fn settle(&self, outcome: Result<T, R>) {
        // unsubscribe first: a re-entrant dispatch on either signal must not find a settlement listener
        unlink(&self.links);

        let sender = self.sender.lock().expect("promise sender lock poisoned").take();
        match sender {
            Some(sender) => {
                tracing::trace!(rejected = outcome.is_err(), "promise settled");
                // the promise may be gone already; nobody to tell
                let _ = sender.send(outcome);
            }
            None => tracing::trace!("promise already settled, ignoring"),
        }
    }
}

fn settle_on<T, R>(resolve_signal: Arc<dyn BaseSignal<T>>, reject_signal: Option<Arc<dyn BaseSignal<R>>>) -> Promise<T, R>
where
    T: Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    let resolve_id = ListenerId::next();
    let reject_id = ListenerId::next();

    let links = Arc::new(Mutex::new(Some(Links {
        resolve: (resolve_signal.clone(), resolve_id),
        reject: reject_signal.clone().map(|signal| (signal, reject_id)),
    })));
    let settlement = Arc::new(Settlement { sender: Mutex::new(Some(sender)), links: links.clone() });

    {
        let settlement = settlement.clone();
        resolve_signal.add(Listener::with_id(resolve_id, Default::default(), move |payload: &T| settlement.settle(Ok(payload.clone()))));
    }
    if let Some(reject_signal) = reject_signal {
        reject_signal.add(Listener::with_id(reject_id, Default::default(), move |reason: &R| settlement.settle(Err(reason.clone()))));
    }

    Promise { receiver, links }
}

/// Resolves with the first payload of `resolve_signal`, or rejects with the first payload of `reject_signal`
pub fn promisify<T, R>(resolve_signal: &Readable<T>, reject_signal: Option<&Readable<R>>) -> Promise<T, R>
where
    T: Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    settle_on(resolve_signal.base().clone(), reject_signal.map(|signal| signal.base().clone()))
}

impl<T: Clone + Send + 'static> Readable<T> {
    /// A promise resolving with the next payload of this signal
    pub fn promisify(&self) -> Promise<T> { settle_on(self.base().clone(), None) }

    /// A promise resolving with the next payload of this signal, or rejecting with the next payload of `reject_signal`
    pub fn promisify_or_reject<R>(&self, reject_signal: &Readable<R>) -> Promise<T, R>
    where R: Clone + Send + 'static {
        settle_on(self.base().clone(), Some(reject_signal.base().clone()))
    }
}
