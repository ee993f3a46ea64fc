//! Wire cursors: position + remaining-capacity views over one contiguous
//! buffer.
//!
//! Every advance checks the remaining budget first and fails with
//! `OutOfBuffer` otherwise, leaving the cursor at its last valid position.
//! Bytes already written by earlier directives are never rolled back; a
//! caller that sees an error must discard the whole buffer.
//!
//! All multi-byte values are big-endian.  Floats travel as their IEEE-754
//! bit pattern; `byteorder`'s `read_f32`/`write_f32` move the bits through
//! an equal-width integer, so the value is never altered by an arithmetic
//! conversion.
//!
//! `WriteCursor` additionally supports patching an already-passed offset:
//! length-prefixed structures of unknown size reserve their prefix up
//! front and backpatch it once the body length is known.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{PackError, Result};

// ── Output ───────────────────────────────────────────────────────────────────

pub struct WriteCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WriteCursor<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn set_position(&mut self, pos: usize) {
        debug_assert!(pos <= self.buf.len());
        self.pos = pos;
    }

    fn take(&mut self, n: usize) -> Result<&mut [u8]> {
        if self.remaining() < n {
            return Err(PackError::OutOfBuffer(String::new()));
        }
        let s = &mut self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn put_u8(&mut self, v: u8) -> Result<()> {
        self.take(1)?[0] = v;
        Ok(())
    }

    pub fn put_i8(&mut self, v: i8) -> Result<()> {
        self.put_u8(v as u8)
    }

    pub fn put_u16(&mut self, v: u16) -> Result<()> {
        BigEndian::write_u16(self.take(2)?, v);
        Ok(())
    }

    pub fn put_i16(&mut self, v: i16) -> Result<()> {
        BigEndian::write_i16(self.take(2)?, v);
        Ok(())
    }

    pub fn put_i32(&mut self, v: i32) -> Result<()> {
        BigEndian::write_i32(self.take(4)?, v);
        Ok(())
    }

    pub fn put_i64(&mut self, v: i64) -> Result<()> {
        BigEndian::write_i64(self.take(8)?, v);
        Ok(())
    }

    pub fn put_f32(&mut self, v: f32) -> Result<()> {
        BigEndian::write_f32(self.take(4)?, v);
        Ok(())
    }

    pub fn put_f64(&mut self, v: f64) -> Result<()> {
        BigEndian::write_f64(self.take(8)?, v);
        Ok(())
    }

    pub fn put_zeros(&mut self, n: usize) -> Result<()> {
        self.take(n)?.fill(0);
        Ok(())
    }

    /// Raw pass-through: copy an opaque byte block into the stream without
    /// interpretation.  Returns the number of bytes written.
    pub fn put_block(&mut self, src: &[u8]) -> Result<usize> {
        self.take(src.len())?.copy_from_slice(src);
        Ok(src.len())
    }

    /// Write at an already-passed offset.  `at` must come from an earlier
    /// `position()`; writing beyond the current position is a programming
    /// error and panics.
    pub fn patch_u8(&mut self, at: usize, v: u8) {
        assert!(at + 1 <= self.pos);
        self.buf[at] = v;
    }

    pub fn patch_u16(&mut self, at: usize, v: u16) {
        assert!(at + 2 <= self.pos);
        BigEndian::write_u16(&mut self.buf[at..at + 2], v);
    }
}

// ── Input ────────────────────────────────────────────────────────────────────

pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn set_position(&mut self, pos: usize) {
        debug_assert!(pos <= self.buf.len());
        self.pos = pos;
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(PackError::OutOfBuffer(String::new()));
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Bounded view over the next `len` bytes.  The parent cursor does not
    /// advance; length-delimited regions decode against their declared
    /// budget, then the parent skips the whole region.
    pub fn sub(&self, len: usize) -> Result<ReadCursor<'a>> {
        if self.remaining() < len {
            return Err(PackError::OutOfBuffer(String::new()));
        }
        Ok(ReadCursor::new(&self.buf[self.pos..self.pos + len]))
    }

    /// Offset of the next NUL byte relative to the current position.
    pub fn find_zero(&self) -> Option<usize> {
        self.buf[self.pos..].iter().position(|&b| b == 0)
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn get_i8(&mut self) -> Result<i8> {
        Ok(self.get_u8()? as i8)
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn get_i16(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(self.take(2)?))
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take(8)?))
    }

    pub fn get_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take(4)?))
    }

    pub fn get_f64(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take(8)?))
    }

    /// Raw pass-through: copy `dest.len()` bytes out of the stream without
    /// interpretation.  Returns the number of bytes read.
    pub fn take_block(&mut self, dest: &mut [u8]) -> Result<usize> {
        dest.copy_from_slice(self.take(dest.len())?);
        Ok(dest.len())
    }
}
