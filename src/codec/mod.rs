//! The ARCP wire codec: a byte-cursor layer (L1) and the message layer (L3)
//! built on top of it. Framing (L4, magic-number resync and length
//! validation) lives in [`crate::framing`].

pub mod cursor;
pub mod message;

pub use message::{Command, CommandId, Header, Message, MsgType, Response, ResponseId};
