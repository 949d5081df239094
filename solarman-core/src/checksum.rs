//! Solarman frame checksum
//!
//! The outer checksum is a plain additive sum, truncated to one byte, over
//! every byte between the start marker and the checksum byte itself.

use tracing::trace;

/// Calculate the additive frame checksum
///
/// # Examples
///
/// ```
/// use solarman_core::checksum;
///
/// assert_eq!(checksum::calculate(&[0x01, 0x02, 0x03, 0x04]), 0x0A);
/// assert_eq!(checksum::calculate(&[]), 0x00);
/// ```
pub fn calculate(data: &[u8]) -> u8 {
    let checksum = data.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte));

    trace!(
        len = data.len(),
        checksum = format!("0x{:02X}", checksum),
        "Calculated checksum"
    );

    checksum
}

/// Verify checksum
pub fn verify(data: &[u8], expected: u8) -> bool {
    calculate(data) == expected
}
