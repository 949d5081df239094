//! Solarman request and response frames
//!
//! # Frame Structure
//!
//! ```text
//! ┌──────────┬────────────────────┬──────────┬──────┐
//! │  Header  │      Payload       │ Checksum │ End  │
//! │ 11 bytes │   Length bytes     │  1 byte  │ 0x15 │
//! └──────────┴────────────────────┴──────────┴──────┘
//! ```
//!
//! The payload starts with a fixed prefix (15 bytes in requests, 14 in
//! responses) followed by a Modbus RTU segment: slave id, function code,
//! data and a CRC-16 of its own.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::{
    checksum,
    constants::{
        control_code, CRC_SIZE, END_BYTE, FRAME_TYPE, HEADER_SIZE, MIN_RTU_SIZE, OFFSET_TIME,
        POWER_ON_TIME, REQUEST_PAYLOAD_PREFIX, RESPONSE_PAYLOAD_PREFIX, SENSOR_TYPE,
        TOTAL_WORKING_TIME, TRAILER_SIZE,
    },
    crc,
    error::{Error, Result},
    header::Header,
    pdu::Pdu,
    sequence::Sequence,
};

/// Largest payload the 16-bit length field can describe
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Outbound Modbus request frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    pub header: Header,
    pub frame_type: u8,
    pub sensor_type: u16,
    pub total_working_time: u32,
    pub power_on_time: u32,
    pub offset_time: u32,
    pub slave_id: u8,
    pub pdu: Pdu,
    pub checksum: u8,
}

impl RequestFrame {
    /// Encode a Modbus request for `slave_id` into a complete frame
    ///
    /// `sequence` is the counter state before this request; the frame carries
    /// its successor, which is returned next to the bytes so the caller can
    /// store it for the following request.
    ///
    /// # Errors
    ///
    /// [`Error::PayloadTooLarge`] if the payload does not fit the length field.
    ///
    /// # Examples
    ///
    /// ```
    /// use solarman_core::{Pdu, RequestFrame, Sequence};
    ///
    /// let pdu = Pdu::new(0x03, vec![0x00, 0x01, 0x00, 0x02]);
    /// let (frame, sequence) = RequestFrame::encode(0x01, &pdu, 0x1234_5678, Sequence::INITIAL).unwrap();
    ///
    /// assert_eq!(frame[0], 0xA5);
    /// assert_eq!(frame[frame.len() - 1], 0x15);
    /// assert_eq!(sequence.value(), 0x01);
    /// ```
    pub fn encode(
        slave_id: u8,
        pdu: &Pdu,
        logger_serial: u32,
        sequence: Sequence,
    ) -> Result<(BytesMut, Sequence)> {
        let mut payload =
            BytesMut::with_capacity(REQUEST_PAYLOAD_PREFIX + 1 + pdu.wire_len() + CRC_SIZE);
        payload.put_u8(FRAME_TYPE);
        payload.put_u16_le(SENSOR_TYPE);
        payload.put_u32_le(TOTAL_WORKING_TIME);
        payload.put_u32_le(POWER_ON_TIME);
        payload.put_u32_le(OFFSET_TIME);
        put_rtu(&mut payload, slave_id, pdu);

        let length = payload_length(&payload)?;
        let sequence = sequence.next();
        let frame = seal(Header::request(length, sequence, logger_serial), &payload);

        trace!(sequence = %sequence, frame = %hex::encode(&frame), "Encoded request");

        Ok((frame, sequence))
    }

    /// Decode an outbound request frame, as a logger would
    ///
    /// Validation follows the same order as [`Response::parse`]; only the
    /// payload prefix differs.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (header, rtu) = validate(data, REQUEST_PAYLOAD_PREFIX)?;

        let mut prefix = &data[HEADER_SIZE..HEADER_SIZE + REQUEST_PAYLOAD_PREFIX];

        Ok(Self {
            header,
            frame_type: prefix.get_u8(),
            sensor_type: prefix.get_u16_le(),
            total_working_time: prefix.get_u32_le(),
            power_on_time: prefix.get_u32_le(),
            offset_time: prefix.get_u32_le(),
            slave_id: rtu[0],
            pdu: rtu_pdu(rtu),
            checksum: data[data.len() - TRAILER_SIZE],
        })
    }
}

/// Decoded payload of a logger response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePayload {
    /// Device class identifier
    pub frame_type: u8,

    /// Request status reported by the logger
    pub status: u8,

    /// Total working time of the logger in seconds
    pub total_working_time: u32,

    /// Current uptime of the logger in seconds
    pub power_on_time: u32,

    /// Offset timestamp in seconds
    pub offset_time: u32,

    /// Modbus slave that answered
    pub slave_id: u8,

    /// Function code and data, without slave id and CRC
    pub pdu: Pdu,
}

impl ResponsePayload {
    /// Payload with zeroed timing counters
    pub fn new(slave_id: u8, pdu: Pdu) -> Self {
        Self {
            frame_type: FRAME_TYPE,
            status: 0x01,
            total_working_time: 0,
            power_on_time: 0,
            offset_time: 0,
            slave_id,
            pdu,
        }
    }

    /// Encode the logger reply to `request`
    ///
    /// The reply echoes the request sequence byte and logger serial and uses
    /// the request control code minus the response offset.
    pub fn encode_reply(&self, request: &Header) -> Result<BytesMut> {
        let mut payload =
            BytesMut::with_capacity(RESPONSE_PAYLOAD_PREFIX + 1 + self.pdu.wire_len() + CRC_SIZE);
        payload.put_u8(self.frame_type);
        payload.put_u8(self.status);
        payload.put_u32_le(self.total_working_time);
        payload.put_u32_le(self.power_on_time);
        payload.put_u32_le(self.offset_time);
        put_rtu(&mut payload, self.slave_id, &self.pdu);

        let header = Header {
            length: payload_length(&payload)?,
            control_code: request
                .control_code
                .wrapping_sub(control_code::RESPONSE_OFFSET),
            ..*request
        };

        Ok(seal(header, &payload))
    }
}

/// Complete logger response
#[derive(Clone, PartialEq, Eq)]
pub struct Response {
    pub header: Header,
    pub payload: ResponsePayload,
    pub checksum: u8,
}

impl Response {
    /// Parse and validate a response frame
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// header size, start byte, checksum, declared length, RTU size, RTU CRC.
    ///
    /// # Examples
    ///
    /// ```
    /// use solarman_core::{Pdu, Response, ResponsePayload, RequestFrame, Sequence};
    ///
    /// let request = Pdu::new(0x03, vec![0x00, 0x01, 0x00, 0x01]);
    /// let (frame, _) = RequestFrame::encode(0x01, &request, 42, Sequence::INITIAL).unwrap();
    /// let request = RequestFrame::parse(&frame).unwrap();
    ///
    /// let reply = ResponsePayload::new(0x01, Pdu::new(0x03, vec![0x02, 0x00, 0x2A]));
    /// let bytes = reply.encode_reply(&request.header).unwrap();
    ///
    /// let response = Response::parse(&bytes).unwrap();
    /// assert_eq!(response.payload.pdu.data.as_ref(), &[0x02, 0x00, 0x2A]);
    /// ```
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (header, rtu) = validate(data, RESPONSE_PAYLOAD_PREFIX)?;

        let mut prefix = &data[HEADER_SIZE..HEADER_SIZE + RESPONSE_PAYLOAD_PREFIX];

        let payload = ResponsePayload {
            frame_type: prefix.get_u8(),
            status: prefix.get_u8(),
            total_working_time: prefix.get_u32_le(),
            power_on_time: prefix.get_u32_le(),
            offset_time: prefix.get_u32_le(),
            slave_id: rtu[0],
            pdu: rtu_pdu(rtu),
        };

        Ok(Self {
            header,
            payload,
            checksum: data[data.len() - TRAILER_SIZE],
        })
    }

    /// The tunneled Modbus PDU
    pub fn pdu(&self) -> &Pdu {
        &self.payload.pdu
    }

    pub fn into_pdu(self) -> Pdu {
        self.payload.pdu
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("header", &self.header)
            .field("status", &format!("0x{:02X}", self.payload.status))
            .field("slave_id", &self.payload.slave_id)
            .field("pdu", &self.payload.pdu)
            .field("checksum", &format!("0x{:02X}", self.checksum))
            .finish()
    }
}

/// Run the frame checks shared by both directions and return the header
/// and the RTU segment (slave id through CRC)
fn validate(data: &[u8], payload_prefix: usize) -> Result<(Header, &[u8])> {
    if data.len() < HEADER_SIZE {
        return Err(Error::FrameTooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let header = Header::parse(data)?;

    let checksum_at = data.len() - TRAILER_SIZE;
    let calculated = checksum::calculate(&data[1..checksum_at]);
    let received = data[checksum_at];
    if calculated != received {
        return Err(Error::ChecksumMismatch {
            calculated,
            received,
        });
    }

    let actual = data.len().saturating_sub(HEADER_SIZE + TRAILER_SIZE);
    if usize::from(header.length) != actual {
        return Err(Error::InvalidLength {
            declared: header.length,
            actual,
        });
    }

    let rtu = data
        .get(HEADER_SIZE + payload_prefix..checksum_at)
        .unwrap_or_default();
    if rtu.len() < MIN_RTU_SIZE {
        return Err(Error::RtuTooShort {
            expected: MIN_RTU_SIZE,
            actual: rtu.len(),
        });
    }

    let (body, tail) = rtu.split_at(rtu.len() - CRC_SIZE);
    let calculated = crc::calculate(body);
    let received = [tail[0], tail[1]];
    if calculated != received {
        return Err(Error::CrcMismatch {
            calculated,
            received,
        });
    }

    Ok((header, rtu))
}

/// Function code and data of a validated RTU segment
fn rtu_pdu(rtu: &[u8]) -> Pdu {
    Pdu {
        function_code: rtu[1],
        data: Bytes::copy_from_slice(&rtu[2..rtu.len() - CRC_SIZE]),
    }
}

fn put_rtu(buf: &mut BytesMut, slave_id: u8, pdu: &Pdu) {
    buf.put_u8(slave_id);
    buf.put_u8(pdu.function_code);
    buf.put_slice(&pdu.data);
    buf.put_slice(&crc::for_pdu(slave_id, pdu));
}

fn payload_length(payload: &[u8]) -> Result<u16> {
    u16::try_from(payload.len()).map_err(|_| Error::PayloadTooLarge {
        size: payload.len(),
        max: MAX_PAYLOAD_SIZE,
    })
}

/// Write header and payload, then append checksum and end marker
fn seal(header: Header, payload: &[u8]) -> BytesMut {
    let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len() + TRAILER_SIZE);
    header.encode_into(&mut frame);
    frame.put_slice(payload);

    let checksum = checksum::calculate(&frame[1..]);
    frame.put_u8(checksum);
    frame.put_u8(END_BYTE);

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::START_BYTE;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Captured logger reply: read of one holding register returning 0x7100... (2 data bytes)
    fn response_bytes() -> Vec<u8> {
        vec![
            0xA5, // Start
            0x16, 0x00, // Length (22 bytes)
            0x10, 0x15, // Control code
            0x01, 0x02, // Sequence number
            0x12, 0x34, 0x56, 0x78, // Logger serial
            0x02, // Frame type
            0x01, // Status
            0x10, 0x00, 0x00, 0x00, // Total working time
            0x20, 0x00, 0x00, 0x00, // Power-on time
            0x30, 0x00, 0x00, 0x00, // Offset time
            0x01, 0x03, 0x02, 0x71, 0x00, 0x01, 0xD5, 0xA9, // Modbus RTU frame
            0xAB, // Checksum
            0x15, // End
        ]
    }

    /// Recompute the outer checksum after editing a frame
    fn reseal(data: &mut [u8]) {
        let at = data.len() - TRAILER_SIZE;
        data[at] = checksum::calculate(&data[1..at]);
    }

    #[test]
    fn test_captured_reply_is_sealed() {
        let data = response_bytes();
        let at = data.len() - TRAILER_SIZE;

        assert_eq!(checksum::calculate(&data[1..at]), data[at]);
        assert_eq!(crc::calculate(&data[25..31]), [data[31], data[32]]);
    }

    #[test]
    fn test_parse_response() {
        let response = Response::parse(&response_bytes()).unwrap();

        assert_eq!(response.header.start, START_BYTE);
        assert_eq!(response.header.length, 22);
        assert_eq!(response.header.control_code, 0x1510);
        assert_eq!(response.header.sequence, 0x01);
        assert_eq!(response.header.logger_serial, 0x7856_3412);
        assert_eq!(response.payload.frame_type, 0x02);
        assert_eq!(response.payload.status, 0x01);
        assert_eq!(response.payload.total_working_time, 0x10);
        assert_eq!(response.payload.power_on_time, 0x20);
        assert_eq!(response.payload.offset_time, 0x30);
        assert_eq!(response.payload.slave_id, 0x01);
        assert_eq!(response.checksum, 0xAB);
    }

    #[test]
    fn test_parse_response_pdu_excludes_slave_and_crc() {
        let response = Response::parse(&response_bytes()).unwrap();

        assert_eq!(response.pdu().function_code, 0x03);
        assert_eq!(response.pdu().data.as_ref(), &[0x02, 0x71, 0x00, 0x01]);
    }

    #[test]
    fn test_parse_too_short() {
        let result = Response::parse(&response_bytes()[..10]);
        assert_eq!(result, Err(Error::FrameTooShort { expected: 11, actual: 10 }));
    }

    #[test]
    fn test_parse_bad_start_byte() {
        let mut data = response_bytes();
        data[0] = 0x5A;

        let result = Response::parse(&data);
        assert_eq!(result, Err(Error::BadStartByte { expected: 0xA5, actual: 0x5A }));
    }

    #[test]
    fn test_parse_checksum_mismatch() {
        let mut data = response_bytes();
        data[33] = 0x00;

        let result = Response::parse(&data);
        assert_eq!(result, Err(Error::ChecksumMismatch { calculated: 0xAB, received: 0x00 }));
    }

    #[test]
    fn test_parse_invalid_length() {
        let mut data = response_bytes();
        data[1] = 0x17;
        reseal(&mut data);

        let result = Response::parse(&data);
        assert_eq!(result, Err(Error::InvalidLength { declared: 23, actual: 22 }));
    }

    #[test]
    fn test_parse_rtu_too_short() {
        // RTU segment cut down to slave, function and CRC
        let mut data = response_bytes();
        data.drain(27..31);
        data[1] = 18;
        reseal(&mut data);

        let result = Response::parse(&data);
        assert_eq!(result, Err(Error::RtuTooShort { expected: 5, actual: 4 }));
    }

    #[test]
    fn test_parse_header_only_frame() {
        // Length field agrees with an empty payload but there is no RTU at all
        let mut data = vec![0xA5, 0x00, 0x00, 0x10, 0x15, 0x01, 0x00, 0x12, 0x34, 0x56, 0x78, 0x00, 0x15];
        reseal(&mut data);

        let result = Response::parse(&data);
        assert_eq!(result, Err(Error::RtuTooShort { expected: 5, actual: 0 }));
    }

    #[test]
    fn test_parse_crc_mismatch() {
        let mut data = response_bytes();
        data[28] = 0x72;
        reseal(&mut data);

        let result = Response::parse(&data);
        assert!(matches!(result, Err(Error::CrcMismatch { received: [0xD5, 0xA9], .. })));
    }

    #[test]
    fn test_encode_request_layout() {
        let pdu = Pdu::new(0x03, vec![0x00, 0x01, 0x00, 0x02]);
        let (frame, sequence) =
            RequestFrame::encode(0x01, &pdu, 0x1234_5678, Sequence::INITIAL).unwrap();

        let mut expected = vec![
            0xA5, 0x17, 0x00, 0x10, 0x45, 0x01, 0x00, 0x78, 0x56, 0x34, 0x12, // Header
            0x02, 0x00, 0x00, // Frame type, sensor type
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // Timing
            0x01, 0x03, 0x00, 0x01, 0x00, 0x02, 0x95, 0xCB, // RTU
            0x00, 0x15,
        ];
        reseal(&mut expected);

        assert_eq!(frame.as_ref(), expected.as_slice());
        assert_eq!(sequence, Sequence::new(0x01));
    }

    #[test]
    fn test_encode_advances_sequence() {
        let pdu = Pdu::new(0x03, vec![0x00, 0x00, 0x00, 0x01]);

        let (first, sequence) = RequestFrame::encode(1, &pdu, 7, Sequence::new(0xFE)).unwrap();
        let (second, sequence) = RequestFrame::encode(1, &pdu, 7, sequence).unwrap();

        assert_eq!(first[5], 0xFF);
        assert_eq!(second[5], 0x00);
        assert_eq!(sequence, Sequence::new(0x00));
    }

    #[test]
    fn test_encode_payload_too_large() {
        let pdu = Pdu::new(0x10, vec![0u8; MAX_PAYLOAD_SIZE]);
        let result = RequestFrame::encode(1, &pdu, 7, Sequence::INITIAL);

        assert!(matches!(result, Err(Error::PayloadTooLarge { max: MAX_PAYLOAD_SIZE, .. })));
    }

    #[test]
    fn test_parse_request() {
        let pdu = Pdu::new(0x06, vec![0x00, 0x10, 0x12, 0x34]);
        let (frame, _) = RequestFrame::encode(0x07, &pdu, 0xCAFE_F00D, Sequence::new(9)).unwrap();

        let request = RequestFrame::parse(&frame).unwrap();

        assert!(request.header.is_request());
        assert_eq!(request.header.sequence, 10);
        assert_eq!(request.header.logger_serial, 0xCAFE_F00D);
        assert_eq!(request.frame_type, FRAME_TYPE);
        assert_eq!(request.sensor_type, SENSOR_TYPE);
        assert_eq!(request.slave_id, 0x07);
        assert_eq!(request.pdu, pdu);
    }

    #[test]
    fn test_encode_reply_mirrors_request() {
        let (frame, _) =
            RequestFrame::encode(1, &Pdu::new(0x03, vec![0, 0, 0, 1]), 0x0102_0304, Sequence::new(4))
                .unwrap();
        let request = RequestFrame::parse(&frame).unwrap();

        let reply = ResponsePayload::new(1, Pdu::new(0x03, vec![0x02, 0xAB, 0xCD]));
        let bytes = reply.encode_reply(&request.header).unwrap();
        let response = Response::parse(&bytes).unwrap();

        assert!(response.header.is_response());
        assert_eq!(response.header.sequence, 5);
        assert_eq!(response.header.logger_serial, 0x0102_0304);
        assert_eq!(response.payload, reply);
    }

    proptest! {
        #[test]
        fn prop_request_round_trip(
            slave_id in any::<u8>(),
            function_code in any::<u8>(),
            data in proptest::collection::vec(any::<u8>(), 1..252),
            serial in any::<u32>(),
            sequence in any::<u8>(),
        ) {
            let pdu = Pdu::new(function_code, data);
            let (frame, _) = RequestFrame::encode(slave_id, &pdu, serial, Sequence::new(sequence)).unwrap();
            let request = RequestFrame::parse(&frame).unwrap();

            prop_assert_eq!(request.slave_id, slave_id);
            prop_assert_eq!(request.pdu, pdu);
        }

        #[test]
        fn prop_response_round_trip(
            function_code in any::<u8>(),
            data in proptest::collection::vec(any::<u8>(), 1..252),
        ) {
            let (frame, _) = RequestFrame::encode(1, &Pdu::new(0x03, vec![0, 0, 0, 1]), 99, Sequence::INITIAL).unwrap();
            let header = Header::parse(&frame).unwrap();

            let reply = ResponsePayload::new(1, Pdu::new(function_code, data));
            let bytes = reply.encode_reply(&header).unwrap();
            let response = Response::parse(&bytes).unwrap();

            prop_assert_eq!(response.into_pdu(), reply.pdu);
        }

        #[test]
        fn prop_payload_flip_fails_checksum(index in HEADER_SIZE..33usize, mask in 1u8..=255) {
            let mut data = response_bytes();
            data[index] ^= mask;

            let result = Response::parse(&data);
            prop_assert!(matches!(result, Err(Error::ChecksumMismatch { .. })), "got {:?}", result);
        }

        #[test]
        fn prop_rtu_flip_fails_crc(index in 25..33usize, mask in 1u8..=255) {
            let mut data = response_bytes();
            data[index] ^= mask;
            reseal(&mut data);

            let result = Response::parse(&data);
            prop_assert!(matches!(result, Err(Error::CrcMismatch { .. })), "got {:?}", result);
        }
    }
}
