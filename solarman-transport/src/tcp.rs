//! TCP link to a Solarman data logging stick
//!
//! One persistent connection per transport. A single lock is held for the
//! whole exchange (connect or reuse, write, read, and any recovery), so
//! concurrent callers queue and responses always pair with the request
//! that preceded them.
//!
//! Each exchange performs exactly one read into a fixed scratch buffer and
//! returns whatever arrived. A response split across TCP segments is not
//! reassembled here.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use solarman_core::constants::{DEFAULT_PORT, DEFAULT_TIMEOUT, READ_BUFFER_SIZE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, trace, warn};

use crate::{
    connector::{BoxStream, Connector, TcpConnector},
    error::{Error, Result},
    retry::{Phase, RetryOnce},
    Transport,
};

/// Link manager for one logger
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use solarman_transport::{TcpTransport, Transport};
///
/// # async fn example(frame: &[u8]) -> solarman_transport::Result<()> {
/// let transport = TcpTransport::new("192.168.1.50:8899")
///     .with_connect_timeout(Duration::from_secs(2))
///     .with_connect_delay(Duration::from_millis(200));
///
/// let response = transport.send(frame).await?;
/// println!("{} bytes", response.len());
///
/// transport.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct TcpTransport<C = TcpConnector> {
    connector: C,
    link: Mutex<Option<BoxStream>>,
    read_timeout: Duration,
    write_timeout: Duration,
    connect_delay: Duration,
    read_buffer_size: usize,
}

impl TcpTransport<TcpConnector> {
    /// Create new TCP transport for `addr` (`host:port`)
    pub fn new(addr: impl Into<String>) -> Self {
        Self::with_connector(TcpConnector::new(addr))
    }

    /// Create new TCP transport for `host` on the default logger port
    pub fn with_host(host: impl AsRef<str>) -> Self {
        Self::new(format!("{}:{}", host.as_ref(), DEFAULT_PORT))
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connector.set_connect_timeout(timeout);
        self
    }

    /// Set connect, read and write timeouts at once
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_connect_timeout(timeout)
            .with_read_timeout(timeout)
            .with_write_timeout(timeout)
    }
}

impl<C: Connector> TcpTransport<C> {
    /// Create a transport that opens streams through `connector`
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            link: Mutex::new(None),
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            connect_delay: Duration::ZERO,
            read_buffer_size: READ_BUFFER_SIZE,
        }
    }

    /// Set read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Settling delay after every successful dial, before the first write
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Size of the scratch buffer a response is read into
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a stream unless one is already live
    async fn dial(&self, link: &mut Option<BoxStream>) -> Result<()> {
        if link.is_some() {
            return Ok(());
        }

        debug!("Connecting to {}...", self.remote_addr());

        *link = Some(self.connector.connect().await?);

        if !self.connect_delay.is_zero() {
            sleep(self.connect_delay).await;
        }

        debug!("Connected to {}", self.remote_addr());
        Ok(())
    }

    /// Drop the current stream and open a new one
    async fn reconnect(&self, link: &mut Option<BoxStream>) -> Result<()> {
        Self::shutdown(link).await;

        self.dial(link).await.map_err(|e| Error::Reconnect {
            addr: self.remote_addr(),
            source: Box::new(e),
        })
    }

    async fn shutdown(link: &mut Option<BoxStream>) {
        if let Some(mut stream) = link.take() {
            // The peer may already be gone
            let _ = stream.shutdown().await;
        }
    }

    async fn write(&self, link: &mut Option<BoxStream>, request: &[u8]) -> Result<()> {
        let stream = live(link).map_err(|source| Error::Write {
            addr: self.remote_addr(),
            source,
        })?;

        let write = async {
            stream.write_all(request).await?;
            stream.flush().await
        };

        match timeout(self.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(Error::Write {
                addr: self.remote_addr(),
                source,
            }),
            Err(_) => Err(Error::WriteTimeout {
                addr: self.remote_addr(),
                timeout: self.write_timeout,
            }),
        }
    }

    async fn read(&self, link: &mut Option<BoxStream>) -> Result<Bytes> {
        let stream = live(link).map_err(|source| Error::Read {
            addr: self.remote_addr(),
            source,
        })?;

        let mut buf = BytesMut::with_capacity(self.read_buffer_size);

        match timeout(self.read_timeout, stream.read_buf(&mut buf)).await {
            Ok(Ok(0)) => Err(Error::Read {
                addr: self.remote_addr(),
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by peer"),
            }),
            Ok(Ok(_)) => Ok(buf.freeze()),
            Ok(Err(source)) => Err(Error::Read {
                addr: self.remote_addr(),
                source,
            }),
            Err(_) => Err(Error::ReadTimeout {
                addr: self.remote_addr(),
                timeout: self.read_timeout,
            }),
        }
    }

    /// Connect, write, read; each I/O phase may recover once from a
    /// peer-closed failure
    async fn exchange(&self, link: &mut Option<BoxStream>, request: &[u8]) -> Result<Bytes> {
        self.dial(link).await?;

        let mut retry = RetryOnce::new(Phase::Write);
        loop {
            match self.write(link, request).await {
                Ok(()) => break,
                Err(err) if err.io_error().is_some_and(|e| retry.admit(e)) => {
                    warn!("Peer closed connection during {}: {}, reconnecting", retry.phase(), err);
                    self.reconnect(link).await?;
                }
                Err(err) => return Err(err),
            }
        }

        let mut retry = RetryOnce::new(Phase::Read);
        loop {
            match self.read(link).await {
                Ok(response) => return Ok(response),
                Err(err) if err.io_error().is_some_and(|e| retry.admit(e)) => {
                    warn!("Peer closed connection during {}: {}, reconnecting", retry.phase(), err);
                    self.reconnect(link).await?;
                    self.write(link, request).await?;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn live(link: &mut Option<BoxStream>) -> io::Result<&mut BoxStream> {
    link.as_mut()
        .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
}

#[async_trait]
impl<C: Connector> Transport for TcpTransport<C> {
    async fn connect(&self) -> Result<()> {
        let mut link = self.link.lock().await;
        self.dial(&mut link).await
    }

    async fn close(&self) -> Result<()> {
        let mut link = self.link.lock().await;

        if link.is_some() {
            debug!("Disconnecting from {}...", self.remote_addr());
            Self::shutdown(&mut link).await;
        }

        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.link.lock().await.is_some()
    }

    async fn send(&self, request: &[u8]) -> Result<Bytes> {
        let mut link = self.link.lock().await;

        match self.exchange(&mut link, request).await {
            Ok(response) => {
                trace!("SENT {}", hex::encode(request));
                trace!("RECD {}", hex::encode(&response));
                Ok(response)
            }
            Err(err) => {
                // Leave no half-used stream behind; the next send dials afresh
                Self::shutdown(&mut link).await;
                Err(err)
            }
        }
    }

    fn remote_addr(&self) -> String {
        self.connector.remote_addr()
    }
}

impl<C> Drop for TcpTransport<C> {
    fn drop(&mut self) {
        if self.link.get_mut().is_some() {
            warn!("TCP transport dropped while still connected");
        }
    }
}
