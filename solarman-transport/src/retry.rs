//! Broken-pipe recovery policy
//!
//! Loggers drop idle TCP connections without notice. When a write or read
//! fails because the peer went away, the link reconnects and repeats the
//! exchange, once. Every other failure, and a second peer-closed failure in
//! the same phase, is surfaced to the caller.

use std::fmt;
use std::io;

/// Exchange phase a recovery budget belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Write,
    Read,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => f.write_str("write"),
            Self::Read => f.write_str("read"),
        }
    }
}

/// True for failures meaning the peer closed the connection
///
/// A zero-byte read is reported by the link as [`io::ErrorKind::UnexpectedEof`]
/// and falls in the same class.
pub fn is_peer_closed(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
    )
}

/// One-shot recovery budget for a single exchange phase
///
/// ```
/// use std::io;
/// use solarman_transport::retry::{Phase, RetryOnce};
///
/// let mut retry = RetryOnce::new(Phase::Write);
/// let broken = io::Error::from(io::ErrorKind::BrokenPipe);
///
/// assert!(retry.admit(&broken));
/// assert!(!retry.admit(&broken));
/// ```
#[derive(Debug)]
pub struct RetryOnce {
    phase: Phase,
    spent: bool,
}

impl RetryOnce {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            spent: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the budget has already been used
    pub fn is_spent(&self) -> bool {
        self.spent
    }

    /// Decide whether `err` earns a reconnect-and-retry
    ///
    /// Returns true at most once, and only for peer-closed failures.
    pub fn admit(&mut self, err: &io::Error) -> bool {
        if self.spent || !is_peer_closed(err) {
            return false;
        }

        self.spent = true;
        true
    }
}
