#![deny(missing_docs)]

//! A wire codec and exchange engine for the Atrad Radar Control Protocol
//! (ARCP), the request/response protocol radar-network master PCs use to
//! talk to transmitter (STX2) and beam-steering (BSM) modules.
//!
//! The crate is layered bottom-up:
//!
//! - [`codec::cursor`], a big-endian byte cursor over a message body.
//! - [`domain`], the request/response payload types (pulse codes,
//!   sequences, phase tables, trigger parameters, system ID/status
//!   records), independent of their wire encoding.
//! - [`codec`], the message layer: headers, command/response IDs, and the
//!   [`codec::Message`] encode/decode pair.
//! - [`framing`], magic-number resynchronization and length framing over a
//!   blocking byte stream, plus an ASCII sideband for interactive use.
//! - [`handle`], the exchange engine: a [`handle::Handle`] correlates
//!   commands with responses by `exchange_id`, negotiates a protocol
//!   version per connection, and exposes a typed request API.
//!
//! Enable logging via the [`log`] crate's usual facade; this crate emits no
//! output on its own without a logger installed.

extern crate byteorder;

pub mod codec;
pub mod constants;
pub mod domain;
pub mod error;
pub mod framing;
pub mod handle;

pub use error::{ArcpError, Result};
pub use handle::{Handle, SysInfo};
