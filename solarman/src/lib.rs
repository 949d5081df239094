//! # solarman
//!
//! Modbus RTU over the Solarman V5 protocol, as spoken by the Wi-Fi/LAN
//! data logging sticks of many solar inverters.
//!
//! ## Features
//!
//! - Frame codec with checksum, CRC and request/response correlation
//! - Async/await API using Tokio
//! - Automatic one-shot reconnect when the logger drops the connection
//!
//! Function-code semantics are left to the caller: a request is a
//! [`Pdu`] (function code plus data) and so is the reply.
//!
//! ## Quick Start
//!
//! ```no_run
//! use solarman::{Pdu, SolarmanClient};
//!
//! #[tokio::main]
//! async fn main() -> solarman::Result<()> {
//!     let client = SolarmanClient::new("192.168.1.50:8899", 2_712_345_678, 1);
//!
//!     // Read two holding registers starting at 0x0003
//!     let request = Pdu::new(0x03, vec![0x00, 0x03, 0x00, 0x02]);
//!     let response = client.call(&request).await?;
//!     println!("{:?}", response);
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;

// Re-exports
pub use client::SolarmanClient;
pub use error::{Error, Result};

// Re-export protocol types
pub use solarman_core::{Header, Packager, Pdu, Response, SolarmanPackager};
pub use solarman_transport::{TcpTransport, Transport};
