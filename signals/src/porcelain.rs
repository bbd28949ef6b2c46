//! Bridges from signals into async code. Requires the `tokio` feature.

mod promise;
mod timer;

pub use promise::*;
pub use timer::*;
