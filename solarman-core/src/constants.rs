//! Protocol constants

use std::time::Duration;

/// First byte of every frame
pub const START_BYTE: u8 = 0xA5;

/// Last byte of every frame
pub const END_BYTE: u8 = 0x15;

/// Control codes carried in header bytes 3..5
pub mod control_code {
    /// Modbus RTU request sent by the client
    pub const REQUEST: u16 = 0x4510;

    /// Logger reply to [`REQUEST`]
    pub const RESPONSE: u16 = 0x1510;

    /// A response control code is always the request code minus this offset
    pub const RESPONSE_OFFSET: u16 = 0x3000;
}

/// Frame type of outgoing requests (0x02 = solar inverter)
pub const FRAME_TYPE: u8 = 0x02;

/// Sensor type of outgoing requests
pub const SENSOR_TYPE: u16 = 0x0000;

/// Total working time field of outgoing requests (always zero)
pub const TOTAL_WORKING_TIME: u32 = 0x0000_0000;

/// Power-on time field of outgoing requests (always zero)
pub const POWER_ON_TIME: u32 = 0x0000_0000;

/// Offset time field of outgoing requests (always zero)
pub const OFFSET_TIME: u32 = 0x0000_0000;

/// Header size: start(1) + length(2) + control(2) + sequence(2) + serial(4)
pub const HEADER_SIZE: usize = 11;

/// Trailer size: checksum(1) + end(1)
pub const TRAILER_SIZE: usize = 2;

/// Response payload bytes before the RTU segment:
/// frame type(1) + status(1) + three timing counters(12)
pub const RESPONSE_PAYLOAD_PREFIX: usize = 14;

/// Request payload bytes before the RTU segment:
/// frame type(1) + sensor type(2) + three timing counters(12)
pub const REQUEST_PAYLOAD_PREFIX: usize = 15;

/// Smallest RTU segment accepted when decoding
pub const MIN_RTU_SIZE: usize = 5;

/// Size of the trailing Modbus CRC inside the RTU segment
pub const CRC_SIZE: usize = 2;

/// Default logger port
pub const DEFAULT_PORT: u16 = 8899;

/// Default dial/read/write timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Scratch buffer size for a single response read
pub const READ_BUFFER_SIZE: usize = 1024;
