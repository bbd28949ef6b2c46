use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T, E = SignalError> = std::result::Result<T, E>;

/// Why a [`Promise`](crate::Promise) did not resolve
#[cfg(feature = "tokio")]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromiseError<R> {
    /// The reject signal fired first. Carries its payload as dispatched.
    #[error("promise rejected")]
    Rejected(R),
    /// The settlement listeners were dropped without either signal firing
    #[error("promise abandoned before settling")]
    Abandoned,
}

#[cfg(feature = "tokio")]
impl<R> PromiseError<R> {
    pub fn rejected(self) -> Option<R> {
        match self {
            PromiseError::Rejected(reason) => Some(reason),
            PromiseError::Abandoned => None,
        }
    }
}
