//! # solarman-core
//!
//! Frame codec for the Solarman V5 protocol spoken by Wi-Fi/LAN data logging
//! sticks that tunnel Modbus RTU over TCP.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame header and request/response encoding/decoding
//! - Outer additive checksum and inner Modbus CRC-16
//! - Request/response correlation checks
//! - Sequence counter and protocol constants
//!
//! No I/O happens here; see `solarman-transport` for the link layer.

pub mod checksum;
pub mod constants;
pub mod crc;
pub mod error;
pub mod frame;
pub mod header;
pub mod packager;
pub mod pdu;
pub mod sequence;
pub mod verify;

pub use error::{Error, Result};
pub use frame::{RequestFrame, Response, ResponsePayload};
pub use header::Header;
pub use packager::{Packager, SolarmanPackager};
pub use pdu::Pdu;
pub use sequence::Sequence;
pub use verify::verify;
