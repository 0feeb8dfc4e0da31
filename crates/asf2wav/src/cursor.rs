//! Bounded little-endian reader over a seekable input.

use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{AsfError, Result};
use crate::guid::Guid;

/// Forward skips up to this size are read through instead of seeking, so a
/// buffered reader keeps its buffer.
const READ_THROUGH_SKIP: u64 = 64 * 1024;

/// Sequential reader that knows where the input ends.
///
/// Every read is all-or-nothing: asking for more bytes than remain is
/// reported as [`AsfError::Truncated`] instead of a short read.
pub struct ByteCursor<R> {
    inner: R,
    pos: u64,
    len: u64,
    /// Byte already pulled from `inner` by [`ByteCursor::peek_u8`]; it sits at `pos`.
    peeked: Option<u8>,
}

impl<R: Read + Seek> ByteCursor<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        Ok(Self {
            inner,
            pos,
            len,
            peeked: None,
        })
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn stream_len(&self) -> u64 {
        self.len
    }

    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.len
    }

    fn ensure(&self, wanted: u64) -> Result<()> {
        if self.remaining() < wanted {
            return Err(AsfError::Truncated { offset: self.pos, wanted });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_into(&mut b)?;
        Ok(b[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_into(&mut b)?;
        Ok(LittleEndian::read_u16(&b))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_into(&mut b)?;
        Ok(LittleEndian::read_u32(&b))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.read_into(&mut b)?;
        Ok(LittleEndian::read_u64(&b))
    }

    pub fn read_guid(&mut self) -> Result<Guid> {
        let mut buf = [0u8; 16];
        self.read_into(&mut buf)?;
        Ok(Guid(buf))
    }

    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.ensure(buf.len() as u64)?;
        let mut start = 0;
        if let (Some(p), Some(first)) = (self.peeked, buf.first_mut()) {
            *first = p;
            self.peeked = None;
            start = 1;
        }
        self.inner.read_exact(&mut buf[start..])?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    /// Read exactly `n` bytes into a freshly allocated buffer.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        // Bounds check before allocating so a corrupt length cannot balloon memory.
        self.ensure(n as u64)?;
        let mut buf = vec![0u8; n];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Unsigned integer whose width is picked by a 2-bit ASF length-type code.
    pub fn read_sized(&mut self, code: u8) -> Result<u32> {
        match code & 3 {
            0 => Ok(0),
            1 => Ok(self.read_u8()? as u32),
            2 => Ok(self.read_u16()? as u32),
            _ => self.read_u32(),
        }
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&mut self) -> Result<u8> {
        if let Some(p) = self.peeked {
            return Ok(p);
        }
        self.ensure(1)?;
        let mut b = [0u8; 1];
        self.inner.read_exact(&mut b)?;
        self.peeked = Some(b[0]);
        Ok(b[0])
    }

    /// Move by a signed offset relative to the current position.
    pub fn skip(&mut self, offset: i64) -> Result<()> {
        if offset == 0 {
            return Ok(());
        }
        if offset > 0 {
            return self.skip_forward(offset as u64);
        }
        if offset.unsigned_abs() > self.pos {
            return Err(AsfError::InvalidData(format!(
                "seek of {offset} bytes from offset {} goes before the start of input",
                self.pos
            )));
        }
        // `inner` is one byte ahead of `pos` while a peeked byte is held.
        let inner_offset = if self.peeked.take().is_some() { offset - 1 } else { offset };
        self.inner.seek(SeekFrom::Current(inner_offset))?;
        self.pos -= offset.unsigned_abs();
        Ok(())
    }

    /// Forward skip by an unsigned byte count.
    pub fn skip_forward(&mut self, n: u64) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.ensure(n)?;
        let inner_n = if self.peeked.take().is_some() { n - 1 } else { n };
        if inner_n <= READ_THROUGH_SKIP {
            let copied = io::copy(&mut (&mut self.inner).take(inner_n), &mut io::sink())?;
            if copied != inner_n {
                return Err(AsfError::Truncated { offset: self.pos, wanted: n });
            }
        } else {
            let inner_n = i64::try_from(inner_n)
                .map_err(|_| AsfError::InvalidData(format!("skip length {n} out of range")))?;
            self.inner.seek(SeekFrom::Current(inner_n))?;
        }
        self.pos += n;
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
