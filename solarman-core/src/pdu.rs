//! Modbus protocol data unit tunneled inside Solarman frames

use std::fmt;

use bytes::Bytes;

/// Function code plus data, independent of addressing and CRC
///
/// This is the unit exchanged with whatever Modbus engine sits on top of
/// the Solarman link.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Pdu {
    /// Modbus function code
    pub function_code: u8,

    /// Function-specific data
    pub data: Bytes,
}

impl Pdu {
    pub fn new(function_code: u8, data: impl Into<Bytes>) -> Self {
        Self {
            function_code,
            data: data.into(),
        }
    }

    /// Length of function code and data on the wire
    pub fn wire_len(&self) -> usize {
        1 + self.data.len()
    }
}

impl fmt::Debug for Pdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pdu")
            .field("function_code", &format!("0x{:02X}", self.function_code))
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}
