//! Request sequence numbers
//!
//! Every outbound frame carries a one-byte sequence number that the logger
//! echoes back. The counter is a plain value: encoding takes the current one
//! and hands back its successor, so the codec itself holds no state.

use std::fmt;

/// Rolling one-byte sequence counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sequence(u8);

impl Sequence {
    /// Counter state before the first request (first frame carries 0x01)
    pub const INITIAL: Sequence = Sequence(0x00);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Value carried by the most recent frame
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Next sequence, wrapping from 0xFF to 0x00
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl From<u8> for Sequence {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_starts_at_zero() {
        assert_eq!(Sequence::INITIAL.value(), 0);
        assert_eq!(Sequence::INITIAL.next().value(), 1);
    }

    #[test]
    fn test_sequence_wraps() {
        let last = Sequence::new(0xFF);
        assert_eq!(last.next(), Sequence::new(0x00));
    }

    #[test]
    fn test_sequence_full_cycle() {
        let mut seq = Sequence::INITIAL;
        for _ in 0..256 {
            seq = seq.next();
        }
        assert_eq!(seq, Sequence::INITIAL);
    }
}
