//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Protocol error: {0}")]
    Core(#[from] solarman_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] solarman_transport::Error),
}

impl Error {
    /// Response frame was corrupted or truncated
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_malformed())
    }

    /// Response did not belong to the request
    pub fn is_correlation(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_correlation())
    }

    /// Link-level failure (dial, read, write or timeout)
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
