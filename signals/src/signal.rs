pub(crate) mod adapted;
pub mod cached;
pub mod read;
pub(crate) mod reduce;
pub mod writable;

pub use cached::*;
pub use read::*;
pub use writable::*;
