//! Transport layer for the Solarman protocol
//!
//! Owns the TCP connection to a data logging stick, serializes exchanges and
//! recovers once from a connection the logger closed behind our back.

pub mod connector;
pub mod error;
pub mod retry;
pub mod tcp;

pub use connector::{BoxStream, Connector, Stream, TcpConnector};
pub use error::{Error, Result};
pub use retry::{Phase, RetryOnce};
pub use tcp::TcpTransport;

use async_trait::async_trait;
use bytes::Bytes;

/// Request/response transport
///
/// Methods take `&self`; implementations serialize concurrent callers
/// internally so one exchange completes before the next starts.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the logger (no-op when already connected)
    async fn connect(&self) -> Result<()>;

    /// Close the connection (no-op when not connected)
    async fn close(&self) -> Result<()>;

    /// Check if connected
    async fn is_connected(&self) -> bool;

    /// Send a complete request frame and return the raw response bytes
    async fn send(&self, request: &[u8]) -> Result<Bytes>;

    /// Get remote address
    fn remote_addr(&self) -> String;
}
