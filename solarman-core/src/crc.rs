//! Modbus RTU CRC-16
//!
//! Reflected polynomial 0xA001, initial register 0xFFFF, emitted low byte
//! first. This is the `CRC_16_MODBUS` catalog entry.

use crc::{Crc, CRC_16_MODBUS};

use crate::pdu::Pdu;

const MODBUS: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Calculate the CRC of an RTU byte sequence as `[lo, hi]`
///
/// # Examples
///
/// ```
/// use solarman_core::crc;
///
/// assert_eq!(crc::calculate(&[0x01, 0x03, 0x02, 0x71, 0x00, 0x01]), [0xD5, 0xA9]);
/// ```
pub fn calculate(data: &[u8]) -> [u8; 2] {
    MODBUS.checksum(data).to_le_bytes()
}

/// CRC over `slave_id`, the function code and the PDU data
pub fn for_pdu(slave_id: u8, pdu: &Pdu) -> [u8; 2] {
    let mut digest = MODBUS.digest();
    digest.update(&[slave_id, pdu.function_code]);
    digest.update(&pdu.data);
    digest.finalize().to_le_bytes()
}
