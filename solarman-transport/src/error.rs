//! Transport errors

use std::io;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Connection to {addr} timed out after {timeout:?}")]
    ConnectionTimeout { addr: String, timeout: Duration },

    #[error("Failed to reconnect to {addr}: {source}")]
    Reconnect {
        addr: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to write to {addr}: {source}")]
    Write {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read from {addr}: {source}")]
    Read {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Write to {addr} timed out after {timeout:?}")]
    WriteTimeout { addr: String, timeout: Duration },

    #[error("Read from {addr} timed out after {timeout:?}")]
    ReadTimeout { addr: String, timeout: Duration },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl Error {
    /// Underlying I/O error of a failed read or write
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Connect { source, .. }
            | Self::Write { source, .. }
            | Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Read or write failed because the peer closed the connection
    pub fn is_peer_closed(&self) -> bool {
        match self {
            Self::Write { source, .. } | Self::Read { source, .. } => {
                crate::retry::is_peer_closed(source)
            }
            _ => false,
        }
    }

    /// Failed while opening the connection (first dial or reconnect)
    pub fn is_connect(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::ConnectionTimeout { .. }
                | Self::Reconnect { .. }
                | Self::InvalidAddress(_)
        )
    }
}
