//! Primitive I/O stream: a byte cursor over a buffer with little-endian
//! fixed-width reads/writes, seek/tell, scoped seek, and alignment.
//!
//! This is the leaf the SAV decoder and encoder are both built on (spec.md
//! §4.1). `Reader` borrows an immutable buffer; `Writer` owns a pre-sized,
//! zero-initialized one. Both share the same seek/tell/scoped-seek contract
//! so the decode and encode call sites read the same way.

use crate::error::{SavDecodeError, SavEncodeError};

/// Read-only cursor over a decoded SAV buffer.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SavDecodeError> {
        let end = self.pos + n;
        if end > self.buf.len() {
            return Err(SavDecodeError::TruncatedInput {
                needed: n,
                offset: self.pos,
                available: self.buf.len().saturating_sub(self.pos),
            });
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], SavDecodeError> {
        self.take(n)
    }

    pub fn read_u16(&mut self) -> Result<u16, SavDecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, SavDecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_s32(&mut self) -> Result<i32, SavDecodeError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, SavDecodeError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_s64(&mut self) -> Result<i64, SavDecodeError> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, SavDecodeError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Acquire the current position, seek to `target`, run `body`, then
    /// restore the saved position regardless of whether `body` succeeded.
    pub fn with_seek<T>(
        &mut self,
        target: usize,
        body: impl FnOnce(&mut Self) -> Result<T, SavDecodeError>,
    ) -> Result<T, SavDecodeError> {
        let saved = self.pos;
        self.pos = target;
        let result = body(self);
        self.pos = saved;
        result
    }
}

/// Write cursor over a pre-sized, zero-initialized encoder buffer.
pub struct Writer {
    buf: Vec<u8>,
    pos: usize,
}

impl Writer {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buf: vec![0u8; buffer_size],
            pos: 0,
        }
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), SavEncodeError> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(SavEncodeError::BufferOverflow {
                offset: self.pos,
                needed: bytes.len(),
                buffer_size: self.buf.len(),
            });
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SavEncodeError> {
        self.put(bytes)
    }

    pub fn write_u16(&mut self, v: u16) -> Result<(), SavEncodeError> {
        self.put(&v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<(), SavEncodeError> {
        self.put(&v.to_le_bytes())
    }

    pub fn write_s32(&mut self, v: i32) -> Result<(), SavEncodeError> {
        self.write_u32(v as u32)
    }

    pub fn write_u64(&mut self, v: u64) -> Result<(), SavEncodeError> {
        self.put(&v.to_le_bytes())
    }

    pub fn write_s64(&mut self, v: i64) -> Result<(), SavEncodeError> {
        self.write_u64(v as u64)
    }

    pub fn write_f32(&mut self, v: f32) -> Result<(), SavEncodeError> {
        self.put(&v.to_le_bytes())
    }

    /// Advance the cursor up to the next multiple of `k`, writing zero bytes.
    pub fn align_up(&mut self, k: usize) -> Result<(), SavEncodeError> {
        let rem = self.pos % k;
        if rem != 0 {
            let pad = k - rem;
            self.put(&vec![0u8; pad])?;
        }
        Ok(())
    }

    /// Acquire the current position, seek to `target`, run `body`, then
    /// restore the saved position regardless of whether `body` succeeded.
    pub fn with_seek<T>(
        &mut self,
        target: usize,
        body: impl FnOnce(&mut Self) -> Result<T, SavEncodeError>,
    ) -> Result<T, SavEncodeError> {
        let saved = self.pos;
        self.pos = target;
        let result = body(self);
        self.pos = saved;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_primitives() {
        let buf = [0x04, 0x03, 0x02, 0x01, 0xFB, 0xFF, 0xFF, 0xFF];
        let mut r = Reader::new(&buf);
        assert_eq!(r.read_u32().unwrap(), 0x01020304);
        assert_eq!(r.read_s32().unwrap(), -5);
    }

    #[test]
    fn truncated_read_fails() {
        let buf = [0x01, 0x02];
        let mut r = Reader::new(&buf);
        assert!(r.read_u32().is_err());
    }

    #[test]
    fn scoped_seek_restores_position_on_success_and_failure() {
        let buf = [0u8; 16];
        let mut r = Reader::new(&buf);
        r.seek(4);
        let _ = r.with_seek(12, |r| r.read_u32());
        assert_eq!(r.tell(), 4);

        let _ = r.with_seek(12, |r| r.read_bytes(100));
        assert_eq!(r.tell(), 4);
    }

    #[test]
    fn align_up_pads_with_zeros() {
        let mut w = Writer::new(16);
        w.write_u16(0xAAAA).unwrap();
        w.align_up(4).unwrap();
        assert_eq!(w.tell(), 4);
        assert_eq!(&w.into_inner()[0..4], &[0xAA, 0xAA, 0x00, 0x00]);
    }

    #[test]
    fn write_past_capacity_overflows() {
        let mut w = Writer::new(2);
        assert!(w.write_u32(1).is_err());
    }

    #[test]
    fn writer_scoped_seek_restores_append_cursor() {
        let mut w = Writer::new(32);
        w.seek(8);
        w.with_seek(20, |w| w.write_u32(42)).unwrap();
        assert_eq!(w.tell(), 8);
        assert_eq!(u32::from_le_bytes(w.into_inner()[20..24].try_into().unwrap()), 42);
    }
}
