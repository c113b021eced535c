use crate::error::BinaryError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Cursor over an immutable byte buffer. Every read checks the remaining
/// length and fails with `UnexpectedEof` instead of panicking.
#[derive(Debug, Clone)]
pub struct BinaryReader {
    buffer: Bytes,
}

impl BinaryReader {
    pub fn new(buffer: Bytes) -> Self {
        Self { buffer }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len()
    }

    fn ensure(&self, len: usize) -> Result<(), BinaryError> {
        if self.buffer.len() < len {
            Err(BinaryError::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, BinaryError> {
        self.ensure(1)?;
        Ok(self.buffer.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16, BinaryError> {
        self.ensure(2)?;
        Ok(self.buffer.get_u16())
    }

    pub fn read_u32(&mut self) -> Result<u32, BinaryError> {
        self.ensure(4)?;
        Ok(self.buffer.get_u32())
    }

    pub fn read_u64(&mut self) -> Result<u64, BinaryError> {
        self.ensure(8)?;
        Ok(self.buffer.get_u64())
    }

    pub fn read_u16_le(&mut self) -> Result<u16, BinaryError> {
        self.ensure(2)?;
        Ok(self.buffer.get_u16_le())
    }

    pub fn read_u32_le(&mut self) -> Result<u32, BinaryError> {
        self.ensure(4)?;
        Ok(self.buffer.get_u32_le())
    }

    /// Splits off the next `len` bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, BinaryError> {
        self.ensure(len)?;
        Ok(self.buffer.split_to(len))
    }

    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<(), BinaryError> {
        self.ensure(out.len())?;
        self.buffer.copy_to_slice(out);
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<(), BinaryError> {
        self.ensure(len)?;
        self.buffer.advance(len);
        Ok(())
    }
}

/// Growable byte buffer for frame assembly. Writes append to memory and
/// cannot fail; fallibility lives in the `Writable` trait, where encoding a
/// type may reject its own field values.
#[derive(Debug, Clone, Default)]
pub struct BinaryWriter {
    buffer: BytesMut,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.put_u16(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.put_u32(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buffer.put_u64(value);
    }

    pub fn write_u16_le(&mut self, value: u16) {
        self.buffer.put_u16_le(value);
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.buffer.put_u32_le(value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.put_slice(bytes);
    }

    pub fn write_zeros(&mut self, count: usize) {
        self.buffer.put_bytes(0, count);
    }

    /// Finishes writing and hands back the mutable buffer, for callers that
    /// patch fields in place (trailing checksums).
    pub fn finish(self) -> BytesMut {
        self.buffer
    }

    pub fn freeze(self) -> Bytes {
        self.buffer.freeze()
    }
}
