//! Client handler: packager plus transport

use std::time::Duration;

use tracing::{debug, trace};

use solarman_core::{Packager, Pdu, Sequence, SolarmanPackager};
use solarman_transport::{TcpTransport, Transport};

use crate::error::Result;

/// Offset of the sequence byte in an encoded request
const SEQUENCE_OFFSET: usize = 5;

/// Solarman client
///
/// Wraps request PDUs into Solarman frames, exchanges them with the logger
/// and hands back the verified reply PDU. Calls may come from several tasks
/// at once; the transport runs them one at a time.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use solarman::{Pdu, SolarmanClient};
///
/// # async fn example() -> solarman::Result<()> {
/// let mut client = SolarmanClient::new("192.168.1.50:8899", 2_712_345_678, 1)
///     .with_timeout(Duration::from_secs(3))
///     .with_connect_delay(Duration::from_millis(500));
///
/// client.connect().await?;
///
/// let reply = client.call(&Pdu::new(0x04, vec![0x00, 0x00, 0x00, 0x0A])).await?;
/// println!("{:?}", reply);
///
/// // Address another inverter behind the same logger
/// client.set_slave(2);
/// # Ok(())
/// # }
/// ```
pub struct SolarmanClient<T = TcpTransport> {
    packager: SolarmanPackager,
    transport: T,
}

impl SolarmanClient<TcpTransport> {
    /// Create a client for the logger at `addr` (`host:port`)
    pub fn new(addr: impl Into<String>, logger_serial: u32, slave_id: u8) -> Self {
        Self::with_transport(TcpTransport::new(addr), logger_serial, slave_id)
    }

    /// Set connect, read and write timeouts
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport = self.transport.with_timeout(timeout);
        self
    }

    /// Settling delay after each dial before the first request
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.transport = self.transport.with_connect_delay(delay);
        self
    }
}

impl<T: Transport> SolarmanClient<T> {
    /// Create a client on top of an existing transport
    pub fn with_transport(transport: T, logger_serial: u32, slave_id: u8) -> Self {
        Self {
            packager: SolarmanPackager::new(logger_serial).with_slave(slave_id),
            transport,
        }
    }

    /// Address a different Modbus slave behind the same logger
    pub fn set_slave(&mut self, slave_id: u8) {
        self.packager.set_slave(slave_id);
    }

    pub fn packager(&self) -> &SolarmanPackager {
        &self.packager
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Connect ahead of the first call
    pub async fn connect(&self) -> Result<()> {
        self.transport.connect().await?;
        Ok(())
    }

    /// Close the connection
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await?;
        Ok(())
    }

    /// Send one request PDU and return the reply PDU
    ///
    /// # Errors
    ///
    /// - Transport errors when the logger cannot be reached
    /// - Malformed-frame errors when the reply is damaged
    /// - Correlation errors when the reply answers some other request
    ///
    /// None of these are retried here; a new call uses a fresh sequence number.
    pub async fn call(&self, pdu: &Pdu) -> Result<Pdu> {
        let request = self.packager.encode(pdu)?;
        let sequence = Sequence::new(request[SEQUENCE_OFFSET]);

        trace!(
            addr = %self.transport.remote_addr(),
            sequence = %sequence,
            "Calling function 0x{:02X}",
            pdu.function_code
        );

        let response = self.transport.send(&request).await?;

        let reply = self.packager.decode(&response)?;
        self.packager.verify(&request, &response)?;

        debug!(
            function_code = reply.function_code,
            len = reply.data.len(),
            "Received reply"
        );

        Ok(reply)
    }
}
