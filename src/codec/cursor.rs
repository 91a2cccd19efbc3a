//! L1: a big-endian read/write cursor over an in-memory message body.
//!
//! This is a thin wrapper around [`byteorder`]'s `Read`/`Write` extension
//! traits; every method maps an I/O failure to
//! [`ArcpError::BadMsg`](crate::error::ArcpError::BadMsg), since within a
//! single message body the only way a read or write can fail is running
//! past the end of the buffer.

use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use std::io::{Cursor, Read, Write};

use crate::error::{ArcpError, Result};

fn underflow(_e: std::io::Error) -> ArcpError {
    ArcpError::BadMsg("message body ended early".into())
}

/// A read cursor over a decoded message body.
pub struct Reader<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    /// Wraps `buf` for reading.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(buf),
        }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        let pos = self.inner.position() as usize;
        self.inner.get_ref().len().saturating_sub(pos)
    }

    /// Reads an unsigned byte.
    pub fn u8(&mut self) -> Result<u8> {
        self.inner.read_u8().map_err(underflow)
    }

    /// Reads a signed byte.
    pub fn i8(&mut self) -> Result<i8> {
        self.inner.read_i8().map_err(underflow)
    }

    /// Reads a big-endian `u16`.
    pub fn u16(&mut self) -> Result<u16> {
        self.inner.read_u16::<BE>().map_err(underflow)
    }

    /// Reads a big-endian `i16`.
    pub fn i16(&mut self) -> Result<i16> {
        self.inner.read_i16::<BE>().map_err(underflow)
    }

    /// Reads a big-endian `u32`.
    pub fn u32(&mut self) -> Result<u32> {
        self.inner.read_u32::<BE>().map_err(underflow)
    }

    /// Reads a big-endian IEEE-754 `f32`.
    pub fn f32(&mut self) -> Result<f32> {
        self.inner.read_f32::<BE>().map_err(underflow)
    }

    /// Reads exactly `n` raw bytes.
    pub fn bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf).map_err(underflow)?;
        Ok(buf)
    }
}

/// A write cursor building up a message body.
#[derive(Default)]
pub struct Writer {
    inner: Vec<u8>,
}

impl Writer {
    /// An empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the writer, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner
    }

    /// Writes an unsigned byte.
    pub fn u8(&mut self, v: u8) -> Result<()> {
        self.inner.write_u8(v).map_err(underflow)
    }

    /// Writes a signed byte.
    pub fn i8(&mut self, v: i8) -> Result<()> {
        self.inner.write_i8(v).map_err(underflow)
    }

    /// Writes a big-endian `u16`.
    pub fn u16(&mut self, v: u16) -> Result<()> {
        self.inner.write_u16::<BE>(v).map_err(underflow)
    }

    /// Writes a big-endian `i16`.
    pub fn i16(&mut self, v: i16) -> Result<()> {
        self.inner.write_i16::<BE>(v).map_err(underflow)
    }

    /// Writes a big-endian `u32`.
    pub fn u32(&mut self, v: u32) -> Result<()> {
        self.inner.write_u32::<BE>(v).map_err(underflow)
    }

    /// Writes a big-endian IEEE-754 `f32`.
    pub fn f32(&mut self, v: f32) -> Result<()> {
        self.inner.write_f32::<BE>(v).map_err(underflow)
    }

    /// Writes raw bytes verbatim.
    pub fn bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf).map_err(underflow)
    }
}
