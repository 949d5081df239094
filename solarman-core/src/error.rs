//! Error types for solarman-core

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Codec and correlation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Frame is too short to hold a header
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },

    /// First byte is not the start marker
    #[error("Invalid start byte: expected 0x{expected:02X}, got 0x{actual:02X}")]
    BadStartByte {
        expected: u8,
        actual: u8,
    },

    /// Outer additive checksum does not match
    #[error("Checksum mismatch: calculated 0x{calculated:02X}, received 0x{received:02X}")]
    ChecksumMismatch {
        calculated: u8,
        received: u8,
    },

    /// Declared payload length differs from the measured one
    #[error("Invalid length: header declares {declared} bytes, payload has {actual} bytes")]
    InvalidLength {
        declared: u16,
        actual: usize,
    },

    /// Embedded RTU segment is too short
    #[error("RTU frame too short: expected at least {expected} bytes, got {actual} bytes")]
    RtuTooShort {
        expected: usize,
        actual: usize,
    },

    /// Inner Modbus CRC-16 does not match
    #[error("CRC mismatch: calculated {calculated:02X?}, received {received:02X?}")]
    CrcMismatch {
        calculated: [u8; 2],
        received: [u8; 2],
    },

    /// Response sequence number differs from the request one
    #[error("Sequence number mismatch: request 0x{request:02X}, response 0x{response:02X}")]
    SequenceMismatch {
        request: u8,
        response: u8,
    },

    /// Response control code is not request code minus the response offset
    #[error("Control code mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    ControlCodeMismatch {
        expected: u16,
        actual: u16,
    },

    /// Response logger serial differs from the request one
    #[error("Logger serial mismatch: request 0x{request:08X}, response 0x{response:08X}")]
    SerialMismatch {
        request: u32,
        response: u32,
    },

    /// Payload does not fit the 16-bit length field
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },
}

impl Error {
    /// Frame was corrupted or truncated on the wire
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. }
                | Self::BadStartByte { .. }
                | Self::ChecksumMismatch { .. }
                | Self::InvalidLength { .. }
                | Self::RtuTooShort { .. }
                | Self::CrcMismatch { .. }
        )
    }

    /// Response does not belong to the request it was paired with
    pub fn is_correlation(&self) -> bool {
        matches!(
            self,
            Self::SequenceMismatch { .. }
                | Self::ControlCodeMismatch { .. }
                | Self::SerialMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_disjoint() {
        let malformed = Error::CrcMismatch { calculated: [0, 1], received: [1, 0] };
        let correlation = Error::SequenceMismatch { request: 1, response: 2 };

        assert!(malformed.is_malformed());
        assert!(!malformed.is_correlation());
        assert!(correlation.is_correlation());
        assert!(!correlation.is_malformed());

        let too_large = Error::PayloadTooLarge { size: 70000, max: 65535 };
        assert!(!too_large.is_malformed());
        assert!(!too_large.is_correlation());
    }

    #[test]
    fn test_display_carries_values() {
        let err = Error::ControlCodeMismatch { expected: 0x1510, actual: 0x1234 };
        assert_eq!(err.to_string(), "Control code mismatch: expected 0x1510, got 0x1234");
    }
}
