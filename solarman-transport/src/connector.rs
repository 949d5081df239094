//! Stream connectors
//!
//! The link does not dial sockets itself; it asks a [`Connector`] for a
//! fresh byte stream whenever it needs one (first use and reconnects).

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use solarman_core::constants::DEFAULT_TIMEOUT;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};

/// Bidirectional async byte stream
pub trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Stream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Boxed stream handed out by connectors
pub type BoxStream = Box<dyn Stream>;

/// Opens new streams to the logger
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new stream
    async fn connect(&self) -> Result<BoxStream>;

    /// Address used in logs and errors
    fn remote_addr(&self) -> String;
}

/// TCP connector with a bounded dial
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    connect_timeout: Duration,
}

impl TcpConnector {
    /// Create a connector for `addr` (`host:port`)
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Resolve address to SocketAddr
    async fn resolve_addr(&self) -> Result<SocketAddr> {
        let mut addrs = tokio::net::lookup_host(&self.addr)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", self.addr, e)))?;

        addrs
            .next()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", self.addr)))
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> Result<BoxStream> {
        let addr = self.resolve_addr().await?;

        debug!("Dialing {}...", addr);

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout {
                addr: self.addr.clone(),
                timeout: self.connect_timeout,
            })?
            .map_err(|source| Error::Connect {
                addr: self.addr.clone(),
                source,
            })?;

        // Disable Nagle's algorithm, frames are small and latency-bound
        stream.set_nodelay(true).map_err(|source| Error::Connect {
            addr: self.addr.clone(),
            source,
        })?;

        Ok(Box::new(stream))
    }

    fn remote_addr(&self) -> String {
        self.addr.clone()
    }
}
