//! Process-wide configuration.
//!
//! There is exactly one global default listener for the whole process. It receives payloads dispatched to any
//! [`Signal`](crate::Signal) that has neither listeners nor an instance default listener. Payloads arrive type-erased,
//! downcast with [`Any::downcast_ref`] to inspect them. Until set, the global default listener is a no-op.
//!
//! The slot is shared across threads. Tests that install a global default listener will observe dispatches made by
//! other tests running concurrently, so filter by payload type.

use std::any::Any;
use std::sync::{Arc, RwLock};

pub type GlobalDefaultListener = Arc<dyn Fn(&dyn Any) + Send + Sync + 'static>;

static GLOBAL_DEFAULT_LISTENER: RwLock<Option<GlobalDefaultListener>> = RwLock::new(None);

/// Replaces the global default listener. Last write wins; no history is kept.
pub fn set_global_default_listener<F>(listener: F)
where F: Fn(&dyn Any) + Send + Sync + 'static {
    *GLOBAL_DEFAULT_LISTENER.write().expect("global default listener lock poisoned") = Some(Arc::new(listener));
}

/// Restores the no-op global default listener
pub fn reset_global_default_listener() { *GLOBAL_DEFAULT_LISTENER.write().expect("global default listener lock poisoned") = None; }

pub(crate) fn call_global_default_listener(payload: &dyn Any) {
    // cloned out so the listener may itself replace the slot
    let listener = GLOBAL_DEFAULT_LISTENER.read().expect("global default listener lock poisoned").clone();
    if let Some(listener) = listener {
        listener(payload);
    }
}
