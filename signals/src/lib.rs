/*!
Typed, synchronous publish/subscribe signals

A [`Signal<T>`] is a list of listeners for payloads of type `T`. `dispatch` calls every registered listener in
registration order before returning. Signals can be derived from (`filter`, `map`, `peek`, `read_only`, `merge`,
`chain`, `reduce`), given a replay cache (`cache`, `cache_last`), and turned into futures (`promisify`, with the
`tokio` feature).

# Design requirements:
- Writers and readers are different types: [`Signal`] dispatches, [`Readable`] only listens. A `Signal` derefs to its `Readable`.
- Every derived signal has its own listener set. Removing a listener from a derived signal never touches another
  derived signal's listeners, only its own adapter on the parent.
- Listeners are identified by value, not by closure: clones of a [`Listener`] are the same listener.
- No lock is held while a listener runs, so listeners may add, remove, dispatch and clear freely.

# Basic usage

```rust
use relay_signals::*;
use std::sync::{Arc, Mutex};

let seen = Arc::new(Mutex::new(Vec::new()));
let signal = Signal::<i32>::new();

let listener = {
    let seen = seen.clone();
    Listener::new(move |value: &String| seen.lock().unwrap().push(value.clone()))
};
let evens = signal.filter(|x| x % 2 == 0).map(|x| format!("even: {x}"));
evens.add(listener.clone());

signal.dispatch(1);
signal.dispatch(2);
evens.remove(&listener);
signal.dispatch(4);

assert_eq!(*seen.lock().unwrap(), vec!["even: 2".to_string()]);
```

# Caches

```rust
use relay_signals::*;
use std::sync::{Arc, Mutex};

let signal = Signal::<&'static str>::new();
let last = signal.cache_last();
signal.dispatch("a");
signal.dispatch("b");

let seen = Arc::new(Mutex::new(Vec::new()));
last.add({
    let seen = seen.clone();
    move |value: &&'static str| seen.lock().unwrap().push(*value)
});
// replayed on add, then live
signal.dispatch("c");
assert_eq!(*seen.lock().unwrap(), vec!["b", "c"]);
```
*/

mod broadcast;
mod cache;
mod context;
mod error;
mod hooks;
mod listener;
mod signal;
mod tag_map;
mod traits;

#[cfg(feature = "tokio")]
mod porcelain;

pub use cache::*;
pub use context::*;
pub use error::*;
pub use listener::*;
pub use signal::*;
pub use traits::*;

#[cfg(feature = "tokio")]
pub use porcelain::*;
