//! The closed set of errors this crate can raise.
//!
//! Every fallible public function returns `Result<T, ArcpError>`. Wire-level
//! response codes (ACK/NAK/UNK, `info_code`) are not errors in this sense;
//! they're ordinary protocol data and are returned as plain values.

use std::fmt;
use std::io;

/// An error raised by the codec, framer, or exchange engine.
#[derive(Debug)]
pub enum ArcpError {
    /// Programmer error: wrong message type supplied to an API, a missing
    /// output, or an invalid ID chosen for a "simple" wrapper.
    Internal(&'static str),

    /// Allocation failure or resource exhaustion detectable locally.
    Local(&'static str),

    /// Wire data failed a structural check: bad magic, bad length, stream
    /// under/overflow, or a count exceeding its domain maximum.
    BadMsg(String),

    /// A response declared a newer protocol version than the command that
    /// solicited it.
    BadProtoVer {
        /// Version carried by the outgoing command.
        command: u16,
        /// Version carried by the incoming response.
        response: u16,
    },

    /// The response ID was valid but not permitted for the issuing command.
    BadResponse {
        /// The command that was sent.
        command: i16,
        /// The response ID that came back.
        response: i16,
    },

    /// The response's `exchange_id` did not match the outstanding command.
    Sequence {
        /// Exchange ID of the outstanding command.
        expected: u16,
        /// Exchange ID carried by the response.
        got: u16,
    },

    /// An API expecting a command message was handed a response, or vice
    /// versa.
    NotCmd,
    /// See [`ArcpError::NotCmd`].
    NotResp,

    /// Reserved for callers implementing slave-side dispatch of a command
    /// this library doesn't itself model.
    UnknownCmd(i16),
    /// See [`ArcpError::UnknownCmd`].
    UnknownResp(i16),

    /// A socket read or write reported would-block / timeout.
    ConnTimeout,

    /// A socket read returned zero bytes or reported an unrecoverable
    /// error.
    ConnDropped,
}

impl fmt::Display for ArcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArcpError::Internal(msg) => write!(f, "internal error: {}", msg),
            ArcpError::Local(msg) => write!(f, "local resource error: {}", msg),
            ArcpError::BadMsg(msg) => write!(f, "malformed ARCP message: {}", msg),
            ArcpError::BadProtoVer { command, response } => write!(
                f,
                "response declared protocol version {:#06x}, newer than command's {:#06x}",
                response, command
            ),
            ArcpError::BadResponse { command, response } => write!(
                f,
                "response id {} is not permitted for command id {}",
                response, command
            ),
            ArcpError::Sequence { expected, got } => write!(
                f,
                "response exchange_id {} does not match outstanding command's {}",
                got, expected
            ),
            ArcpError::NotCmd => write!(f, "expected a command message, got a response"),
            ArcpError::NotResp => write!(f, "expected a response message, got a command"),
            ArcpError::UnknownCmd(id) => write!(f, "unknown command id {}", id),
            ArcpError::UnknownResp(id) => write!(f, "unknown response id {}", id),
            ArcpError::ConnTimeout => write!(f, "connection timed out"),
            ArcpError::ConnDropped => write!(f, "connection dropped"),
        }
    }
}

impl std::error::Error for ArcpError {}

impl From<io::Error> for ArcpError {
    /// Would-block/timeout maps to `ConnTimeout`; anything else observed
    /// after a zero-byte read or hard failure maps to `ConnDropped`.
    /// `Interrupted` is handled by the caller's retry loop and should never
    /// reach this conversion.
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ArcpError::ConnTimeout,
            _ => ArcpError::ConnDropped,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ArcpError>;
