//! L4: frame synchronization over a blocking byte stream.
//!
//! ARCP has no fixed message boundary markers other than a 4-byte magic
//! number at the start of every frame. A reader resyncs to that magic
//! number one byte at a time via a shift register, exactly as it would
//! resync to a fixed sync word in a push-based deframer, the difference
//! being that the accumulator is filled by blocking reads off a
//! `std::io::Read` rather than by bytes pushed in one at a time.
//!
//! Some deployments multiplex a human-readable ASCII sideband (terminated
//! by `\n`, optionally `\r\n`) onto the same connection, for use by a
//! terminal operator probing the module directly. [`FrameMode`] controls
//! whether a reader accepts ARCP frames, ASCII lines, or both.

use std::io::{Read, Write};

use crate::constants::{HEADER_SIZE, MAGIC, MAX_MSG_SIZE};
use crate::error::{ArcpError, Result};

/// Which kind of frame a reader is willing to recognize.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameMode {
    /// Only binary ARCP frames.
    Arcp,
    /// Only `\n`-terminated ASCII lines.
    Ascii,
    /// Either, whichever is seen first.
    Either,
}

impl FrameMode {
    fn wants_arcp(self) -> bool {
        matches!(self, FrameMode::Arcp | FrameMode::Either)
    }

    fn wants_ascii(self) -> bool {
        matches!(self, FrameMode::Ascii | FrameMode::Either)
    }
}

/// One frame recognized on the wire.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Frame {
    /// A complete ARCP message: the header tail and body, i.e. everything
    /// after `magic` and `msg_length`. Hand this to
    /// [`crate::codec::Message::decode`].
    Arcp(Vec<u8>),
    /// A line of ASCII text, with any trailing `\r\n`/`\n` stripped.
    Ascii(String),
}

fn read_exact_mapped<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => return Err(ArcpError::ConnDropped),
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn read_one<R: Read>(r: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    read_exact_mapped(r, &mut byte)?;
    Ok(byte[0])
}

/// Reads and resyncs to the next frame matching `mode`.
///
/// On an ARCP frame, the returned buffer is the header tail and body,
/// `msg_length - 6` bytes, ready to pass to
/// [`crate::codec::Message::decode`]. On an ASCII frame, the returned
/// string has any trailing `\r\n` or `\n` stripped.
pub fn read_frame<R: Read>(r: &mut R, mode: FrameMode) -> Result<Frame> {
    let mut accum: u32 = 0;
    let mut seen: Vec<u8> = Vec::with_capacity(4);

    loop {
        let byte = read_one(r)?;
        accum = (accum << 8) | u32::from(byte);
        seen.push(byte);

        if mode.wants_arcp() && seen.len() >= 4 && accum == MAGIC {
            let mut len_buf = [0u8; 2];
            read_exact_mapped(r, &mut len_buf)?;
            let msg_length = u16::from_be_bytes(len_buf);
            if msg_length as usize <= HEADER_SIZE || msg_length as usize > MAX_MSG_SIZE {
                return Err(ArcpError::BadMsg(format!(
                    "message length {} out of range",
                    msg_length
                )));
            }
            let mut body = vec![0u8; usize::from(msg_length) - 6];
            read_exact_mapped(r, &mut body)?;
            return Ok(Frame::Arcp(body));
        }

        if mode.wants_ascii() && byte == b'\n' {
            seen.pop();
            if seen.last() == Some(&b'\r') {
                seen.pop();
            }
            return Ok(Frame::Ascii(String::from_utf8_lossy(&seen).into_owned()));
        }
    }
}

/// Encodes `message` as a complete ARCP frame and writes it to `w`.
pub fn write_arcp_frame<W: Write>(w: &mut W, body: &[u8], msg_length: u16) -> Result<()> {
    let mut frame = Vec::with_capacity(usize::from(msg_length));
    frame.extend_from_slice(&MAGIC.to_be_bytes());
    frame.extend_from_slice(&msg_length.to_be_bytes());
    frame.extend_from_slice(body);
    w.write_all(&frame).map_err(ArcpError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn resyncs_past_garbage_prefix() {
        let mut data = vec![0xffu8, 0x00, 0x11];
        data.extend_from_slice(&MAGIC.to_be_bytes());
        data.extend_from_slice(&13u16.to_be_bytes());
        data.extend_from_slice(&[0u8; 7]);
        let mut cursor = Cursor::new(data);
        let frame = read_frame(&mut cursor, FrameMode::Arcp).unwrap();
        match frame {
            Frame::Arcp(body) => assert_eq!(body.len(), 7),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn rejects_length_at_or_below_header_size() {
        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC.to_be_bytes());
        data.extend_from_slice(&11u16.to_be_bytes());
        let mut cursor = Cursor::new(data);
        assert!(read_frame(&mut cursor, FrameMode::Arcp).is_err());
    }

    #[test]
    fn ascii_line_strips_crlf() {
        let mut cursor = Cursor::new(b"hi\r\n".to_vec());
        let frame = read_frame(&mut cursor, FrameMode::Ascii).unwrap();
        assert_eq!(frame, Frame::Ascii("hi".to_string()));
    }

    #[test]
    fn ascii_line_without_cr() {
        let mut cursor = Cursor::new(b"ok\n".to_vec());
        let frame = read_frame(&mut cursor, FrameMode::Ascii).unwrap();
        assert_eq!(frame, Frame::Ascii("ok".to_string()));
    }

    #[test]
    fn write_then_read_round_trips() {
        let body = vec![1u8, 2, 3, 4, 5];
        let msg_length = (HEADER_SIZE + body.len()) as u16;
        let mut buf = Vec::new();
        write_arcp_frame(&mut buf, &body, msg_length).unwrap();
        let mut cursor = Cursor::new(buf);
        match read_frame(&mut cursor, FrameMode::Arcp).unwrap() {
            Frame::Arcp(read_body) => assert_eq!(read_body, body),
            _ => panic!("wrong variant"),
        }
    }
}
