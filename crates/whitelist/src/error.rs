use thiserror::Error;

/// Errors surfaced by whitelist stores.
#[derive(Debug, Error)]
pub enum WhitelistError {
    /// The backing store could not be read or written.
    #[error("whitelist backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The stored record exists but could not be decoded.
    #[error("corrupt whitelist record: {0}")]
    Corrupt(String),

    /// A lock guarding the in-memory set was poisoned by a panicking writer.
    #[error("whitelist lock poisoned")]
    Poisoned,
}

impl WhitelistError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, WhitelistError>;
