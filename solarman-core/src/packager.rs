//! Packager: the codec seam a Modbus engine calls into
//!
//! A Modbus client encodes a request PDU through [`Packager::encode`], hands
//! the bytes to a transport, then decodes and verifies the reply. The
//! packager owns the slave id, the logger serial and the sequence counter.

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    error::Result,
    frame::{RequestFrame, Response},
    pdu::Pdu,
    sequence::Sequence,
    verify,
};

/// Turns PDUs into wire frames and back
pub trait Packager: Send + Sync {
    /// Set the Modbus slave addressed by subsequent requests
    fn set_slave(&mut self, slave_id: u8);

    /// Encode a request PDU into a complete frame
    fn encode(&self, pdu: &Pdu) -> Result<Bytes>;

    /// Decode a response frame into its PDU
    fn decode(&self, frame: &[u8]) -> Result<Pdu>;

    /// Check that `response` answers `request`
    fn verify(&self, request: &[u8], response: &[u8]) -> Result<()>;
}

/// Solarman V5 packager
///
/// Thread-safe: the sequence counter sits behind a lock so a shared
/// packager hands out distinct sequence numbers.
#[derive(Debug)]
pub struct SolarmanPackager {
    slave_id: u8,
    logger_serial: u32,
    sequence: Mutex<Sequence>,
}

impl SolarmanPackager {
    /// Create a packager for the logger with serial `logger_serial`
    pub fn new(logger_serial: u32) -> Self {
        Self {
            slave_id: 0x01,
            logger_serial,
            sequence: Mutex::new(Sequence::INITIAL),
        }
    }

    /// Set the Modbus slave id
    pub fn with_slave(mut self, slave_id: u8) -> Self {
        self.slave_id = slave_id;
        self
    }

    pub fn slave_id(&self) -> u8 {
        self.slave_id
    }

    pub fn logger_serial(&self) -> u32 {
        self.logger_serial
    }

    /// Sequence number carried by the most recent request
    pub fn sequence(&self) -> Sequence {
        *self.sequence.lock()
    }
}

impl Packager for SolarmanPackager {
    fn set_slave(&mut self, slave_id: u8) {
        self.slave_id = slave_id;
    }

    fn encode(&self, pdu: &Pdu) -> Result<Bytes> {
        let mut sequence = self.sequence.lock();

        let (frame, next) = RequestFrame::encode(self.slave_id, pdu, self.logger_serial, *sequence)?;
        *sequence = next;

        debug!(
            slave_id = self.slave_id,
            function_code = pdu.function_code,
            sequence = %next,
            "Encoded request frame"
        );

        Ok(frame.freeze())
    }

    fn decode(&self, frame: &[u8]) -> Result<Pdu> {
        Ok(Response::parse(frame)?.into_pdu())
    }

    fn verify(&self, request: &[u8], response: &[u8]) -> Result<()> {
        verify::verify(request, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{frame::ResponsePayload, header::Header, Error};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_packager_defaults() {
        let packager = SolarmanPackager::new(0x1234_5678);

        assert_eq!(packager.slave_id(), 0x01);
        assert_eq!(packager.logger_serial(), 0x1234_5678);
        assert_eq!(packager.sequence(), Sequence::INITIAL);
    }

    #[test]
    fn test_encode_increments_sequence() {
        let packager = SolarmanPackager::new(42).with_slave(3);
        let pdu = Pdu::new(0x03, vec![0x00, 0x00, 0x00, 0x0A]);

        let first = packager.encode(&pdu).unwrap();
        let second = packager.encode(&pdu).unwrap();

        assert_eq!(first[5], 0x01);
        assert_eq!(second[5], 0x02);
        assert_eq!(first[26], 3);
        assert_eq!(packager.sequence(), Sequence::new(2));
    }

    #[test]
    fn test_set_slave() {
        let mut packager = SolarmanPackager::new(42);
        packager.set_slave(0x10);

        let frame = packager.encode(&Pdu::new(0x04, vec![0, 0, 0, 1])).unwrap();
        assert_eq!(frame[26], 0x10);
    }

    #[test]
    fn test_encode_decode_verify() {
        let packager = SolarmanPackager::new(0x0A0B_0C0D);
        let request = packager.encode(&Pdu::new(0x03, vec![0x00, 0x64, 0x00, 0x01])).unwrap();

        let header = Header::parse(&request).unwrap();
        let reply = ResponsePayload::new(0x01, Pdu::new(0x03, vec![0x02, 0x01, 0xF4]));
        let response = reply.encode_reply(&header).unwrap();

        let pdu = packager.decode(&response).unwrap();
        assert_eq!(pdu, Pdu::new(0x03, vec![0x02, 0x01, 0xF4]));
        assert_eq!(packager.verify(&request, &response), Ok(()));
    }

    #[test]
    fn test_verify_stale_response() {
        let packager = SolarmanPackager::new(1);
        let pdu = Pdu::new(0x03, vec![0, 0, 0, 1]);

        let first = packager.encode(&pdu).unwrap();
        let second = packager.encode(&pdu).unwrap();

        let header = Header::parse(&first).unwrap();
        let stale = ResponsePayload::new(1, Pdu::new(0x03, vec![0x02, 0, 0]))
            .encode_reply(&header)
            .unwrap();

        assert_eq!(
            packager.verify(&second, &stale),
            Err(Error::SequenceMismatch { request: 2, response: 1 })
        );
    }
}
