//! Solarman frame header

use std::fmt;

use bytes::{Buf, BufMut, BytesMut};

use crate::{
    constants::{control_code, HEADER_SIZE, START_BYTE},
    error::{Error, Result},
    sequence::Sequence,
};

/// Fixed 11-byte frame header
///
/// # Layout
///
/// ```text
/// ┌───────┬──────────┬──────────────┬──────────┬──────────┬───────────────┐
/// │ Start │  Length  │ Control code │ Sequence │ Reserved │ Logger serial │
/// │ 0xA5  │ LE u16   │   LE u16     │    u8    │    u8    │    LE u32     │
/// └───────┴──────────┴──────────────┴──────────┴──────────┴───────────────┘
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Start marker, always [`START_BYTE`] once parsed
    pub start: u8,

    /// Payload length in bytes
    pub length: u16,

    /// Direction/type of the frame
    pub control_code: u16,

    /// Request sequence number (offset 5)
    pub sequence: u8,

    /// Second byte of the sequence slot (offset 6), zero in requests
    pub reserved: u8,

    /// Serial number of the data logging stick
    pub logger_serial: u32,
}

impl Header {
    pub const SIZE: usize = HEADER_SIZE;

    /// Header of an outbound Modbus request
    pub fn request(length: u16, sequence: Sequence, logger_serial: u32) -> Self {
        Self {
            start: START_BYTE,
            length,
            control_code: control_code::REQUEST,
            sequence: sequence.value(),
            reserved: 0x00,
            logger_serial,
        }
    }

    /// Parse a header from the first 11 bytes of `data`
    ///
    /// # Errors
    ///
    /// - [`Error::FrameTooShort`] if fewer than 11 bytes are given
    /// - [`Error::BadStartByte`] if the start marker is wrong
    ///
    /// # Examples
    ///
    /// ```
    /// use solarman_core::Header;
    ///
    /// let header = Header::parse(&[0xA5, 0x0E, 0x00, 0x10, 0x45, 0x01, 0x02, 0x12, 0x34, 0x56, 0x78]).unwrap();
    /// assert_eq!(header.length, 14);
    /// assert_eq!(header.control_code, 0x4510);
    /// assert_eq!(header.logger_serial, 0x7856_3412);
    /// ```
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::FrameTooShort {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let mut buf = &data[..HEADER_SIZE];

        let start = buf.get_u8();
        if start != START_BYTE {
            return Err(Error::BadStartByte {
                expected: START_BYTE,
                actual: start,
            });
        }

        Ok(Self {
            start,
            length: buf.get_u16_le(),
            control_code: buf.get_u16_le(),
            sequence: buf.get_u8(),
            reserved: buf.get_u8(),
            logger_serial: buf.get_u32_le(),
        })
    }

    /// Append the encoded header to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u8(self.start);
        buf.put_u16_le(self.length);
        buf.put_u16_le(self.control_code);
        buf.put_u8(self.sequence);
        buf.put_u8(self.reserved);
        buf.put_u32_le(self.logger_serial);
    }

    /// Both sequence slot bytes read as one little-endian word
    pub fn sequence_word(&self) -> u16 {
        u16::from_le_bytes([self.sequence, self.reserved])
    }

    pub fn is_request(&self) -> bool {
        self.control_code == control_code::REQUEST
    }

    pub fn is_response(&self) -> bool {
        self.control_code == control_code::RESPONSE
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("length", &self.length)
            .field("control_code", &format!("0x{:04X}", self.control_code))
            .field("sequence", &format!("0x{:02X}", self.sequence))
            .field("reserved", &format!("0x{:02X}", self.reserved))
            .field("logger_serial", &self.logger_serial)
            .finish()
    }
}
