//! Request/response correlation
//!
//! [`verify`] is run on the raw buffers after a response has been decoded.
//! It confirms the response belongs to the request: same sequence byte,
//! matching control code and same logger serial.

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::{
    checksum,
    constants::{control_code::RESPONSE_OFFSET, HEADER_SIZE, START_BYTE, TRAILER_SIZE},
    error::{Error, Result},
};

/// Offset of the sequence byte in the header
const SEQUENCE_OFFSET: usize = 5;

/// Verify that `response` answers `request`
///
/// # Errors
///
/// - [`Error::FrameTooShort`] if either buffer is shorter than a header
/// - [`Error::BadStartByte`] / [`Error::ChecksumMismatch`] for a damaged response
/// - [`Error::SequenceMismatch`], [`Error::ControlCodeMismatch`] or
///   [`Error::SerialMismatch`] when the pair does not correlate
pub fn verify(request: &[u8], response: &[u8]) -> Result<()> {
    for frame in [response, request] {
        if frame.len() < HEADER_SIZE {
            return Err(Error::FrameTooShort {
                expected: HEADER_SIZE,
                actual: frame.len(),
            });
        }
    }

    if response[0] != START_BYTE {
        return Err(Error::BadStartByte {
            expected: START_BYTE,
            actual: response[0],
        });
    }

    let checksum_at = response.len() - TRAILER_SIZE;
    let calculated = checksum::calculate(&response[1..checksum_at]);
    if calculated != response[checksum_at] {
        return Err(Error::ChecksumMismatch {
            calculated,
            received: response[checksum_at],
        });
    }

    if request[SEQUENCE_OFFSET] != response[SEQUENCE_OFFSET] {
        return Err(Error::SequenceMismatch {
            request: request[SEQUENCE_OFFSET],
            response: response[SEQUENCE_OFFSET],
        });
    }

    let expected = LittleEndian::read_u16(&request[3..5]).wrapping_sub(RESPONSE_OFFSET);
    let actual = LittleEndian::read_u16(&response[3..5]);
    if expected != actual {
        return Err(Error::ControlCodeMismatch { expected, actual });
    }

    if request[7..HEADER_SIZE] != response[7..HEADER_SIZE] {
        return Err(Error::SerialMismatch {
            request: LittleEndian::read_u32(&request[7..HEADER_SIZE]),
            response: LittleEndian::read_u32(&response[7..HEADER_SIZE]),
        });
    }

    trace!(sequence = request[SEQUENCE_OFFSET], "Response correlates with request");

    Ok(())
}
