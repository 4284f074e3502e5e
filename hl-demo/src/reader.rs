//! Bounds-checked little-endian reads over the demo buffer

use byteorder::{ByteOrder, LittleEndian};
use glam::Vec3;

/// A read would have crossed the reader's limit.
///
/// `offset` is the limit itself: the first byte that was not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Overrun {
    pub offset: usize,
}

/// Read cursor over `data[..limit]` with absolute positions.
///
/// The limit is a record or segment boundary; no read ever crosses it,
/// even when the underlying buffer continues past it.
#[derive(Clone)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    limit: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            limit: data.len(),
        }
    }

    /// Reader over `start..end`, with `end` clamped to the buffer length.
    pub fn with_range(data: &'a [u8], start: usize, end: usize) -> Self {
        Self {
            data,
            pos: start,
            limit: end.min(data.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes left before the limit
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.pos)
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Overrun> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Borrow `n` bytes without copying
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Overrun> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Overrun> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, Overrun> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16, Overrun> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, Overrun> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, Overrun> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32, Overrun> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3, Overrun> {
        let bytes = self.read_bytes(12)?;
        let mut xyz = [0.0f32; 3];
        LittleEndian::read_f32_into(bytes, &mut xyz);
        Ok(Vec3::from_array(xyz))
    }

    /// Fixed-width, NUL-padded string field
    pub fn read_fixed_string(&mut self, width: usize) -> Result<String, Overrun> {
        Ok(read_string(self.read_bytes(width)?))
    }

    fn ensure(&self, n: usize) -> Result<(), Overrun> {
        match self.pos.checked_add(n) {
            Some(end) if end <= self.limit => Ok(()),
            _ => Err(Overrun { offset: self.limit }),
        }
    }
}

/// Decode a NUL-terminated string, replacing invalid UTF-8
pub(crate) fn read_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
