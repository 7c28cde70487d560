//! Low-level wire primitives.
//!
//! ```text
//! fixed-width       raw little-endian bytes
//! string, uint8[]   u32 LE byte count | bytes
//! T[]               u32 LE element count | elements
//! T[N]              elements
//! composite         fields, inline
//! ```
//!
//! Used by [`MessageCodec`](crate::MessageCodec) and by generated bindings.
//! The `field` argument labels errors and costs nothing on success.

use bytes::{BufMut, BytesMut};

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::value::{Duration, Time};

pub use msgprims_schema::LENGTH_PREFIX_SIZE;

/// Cursor over a read-only byte buffer.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    config: CodecConfig,
    empty_budget: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_config(buf, 0, CodecConfig::default())
    }

    /// Create a reader positioned at `offset` with explicit limits.
    pub fn with_config(buf: &'a [u8], offset: usize, config: CodecConfig) -> Self {
        Self {
            buf,
            pos: offset,
            config,
            empty_budget: config.max_empty_elements,
        }
    }

    /// Current absolute offset in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Consume exactly `n` bytes.
    pub fn take(&mut self, n: usize, field: &str) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(CodecError::BufferUnderflow {
                field: field.to_string(),
                offset: self.pos,
                needed: n,
                remaining,
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..self.pos])
    }

    fn take_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let bytes = self.take(N, field)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.take_array::<1>(field)?[0])
    }

    pub fn read_i8(&mut self, field: &str) -> Result<i8> {
        Ok(i8::from_le_bytes(self.take_array(field)?))
    }

    /// Read a bool; only 0 and 1 are accepted.
    pub fn read_bool(&mut self, field: &str) -> Result<bool> {
        let offset = self.pos;
        match self.read_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(CodecError::InvalidBool {
                field: field.to_string(),
                offset,
                byte,
            }),
        }
    }

    pub fn read_u16(&mut self, field: &str) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_i16(&mut self, field: &str) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_u32(&mut self, field: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_i32(&mut self, field: &str) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_u64(&mut self, field: &str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_i64(&mut self, field: &str) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_f32(&mut self, field: &str) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_f64(&mut self, field: &str) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_time(&mut self, field: &str) -> Result<Time> {
        let secs = self.read_u32(field)?;
        let nsecs = self.read_u32(field)?;
        Ok(Time { secs, nsecs })
    }

    pub fn read_duration(&mut self, field: &str) -> Result<Duration> {
        let secs = self.read_i32(field)?;
        let nsecs = self.read_i32(field)?;
        Ok(Duration { secs, nsecs })
    }

    /// Read a `u32` element count and check it against the array limit and
    /// against the bytes left, given the smallest encoded element width.
    ///
    /// Zero-width elements draw from a budget shared by every count this
    /// reader returns (`max_empty_elements`).
    pub fn read_count(&mut self, field: &str, min_element_size: usize) -> Result<usize> {
        let count = self.read_u32(field)? as usize;
        if count > self.config.max_array_len {
            return Err(CodecError::LengthOverflow {
                field: field.to_string(),
                length: count,
                max: self.config.max_array_len,
            });
        }
        if min_element_size == 0 {
            if count > self.empty_budget {
                return Err(CodecError::LengthOverflow {
                    field: field.to_string(),
                    length: count,
                    max: self.empty_budget,
                });
            }
            self.empty_budget -= count;
            return Ok(count);
        }
        let needed = count.saturating_mul(min_element_size);
        let remaining = self.remaining();
        if needed > remaining {
            return Err(CodecError::BufferUnderflow {
                field: field.to_string(),
                offset: self.pos,
                needed,
                remaining,
            });
        }
        Ok(count)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self, field: &str) -> Result<String> {
        let len = self.read_u32(field)? as usize;
        if len > self.config.max_string_len {
            return Err(CodecError::LengthOverflow {
                field: field.to_string(),
                length: len,
                max: self.config.max_string_len,
            });
        }
        let offset = self.pos;
        let bytes = self.take(len, field)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| CodecError::InvalidUtf8 {
                field: field.to_string(),
                offset,
            })
    }

    /// Read a length-prefixed byte array (`uint8[]`).
    pub fn read_byte_vec(&mut self, field: &str) -> Result<Vec<u8>> {
        let len = self.read_count(field, 1)?;
        Ok(self.take(len, field)?.to_vec())
    }
}

/// Appends wire-encoded values to a caller-owned buffer.
#[derive(Debug)]
pub struct WireWriter<'a> {
    dst: &'a mut BytesMut,
    config: CodecConfig,
}

impl<'a> WireWriter<'a> {
    pub fn new(dst: &'a mut BytesMut) -> Self {
        Self::with_config(dst, CodecConfig::default())
    }

    pub fn with_config(dst: &'a mut BytesMut, config: CodecConfig) -> Self {
        Self { dst, config }
    }

    /// Bytes in the underlying buffer, including anything written before.
    pub fn len(&self) -> usize {
        self.dst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dst.is_empty()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.dst.truncate(len);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.dst.put_u8(u8::from(value));
    }

    pub fn put_u8(&mut self, value: u8) {
        self.dst.put_u8(value);
    }

    pub fn put_i8(&mut self, value: i8) {
        self.dst.put_i8(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.dst.put_u16_le(value);
    }

    pub fn put_i16(&mut self, value: i16) {
        self.dst.put_i16_le(value);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.dst.put_u32_le(value);
    }

    pub fn put_i32(&mut self, value: i32) {
        self.dst.put_i32_le(value);
    }

    pub fn put_u64(&mut self, value: u64) {
        self.dst.put_u64_le(value);
    }

    pub fn put_i64(&mut self, value: i64) {
        self.dst.put_i64_le(value);
    }

    pub fn put_f32(&mut self, value: f32) {
        self.dst.put_f32_le(value);
    }

    pub fn put_f64(&mut self, value: f64) {
        self.dst.put_f64_le(value);
    }

    pub fn put_time(&mut self, value: Time) {
        self.put_u32(value.secs);
        self.put_u32(value.nsecs);
    }

    pub fn put_duration(&mut self, value: Duration) {
        self.put_i32(value.secs);
        self.put_i32(value.nsecs);
    }

    /// Write a variable-length array's element count.
    pub fn put_count(&mut self, count: usize, field: &str) -> Result<()> {
        let prefix = checked_prefix(count, self.config.max_array_len, field)?;
        self.put_u32(prefix);
        Ok(())
    }

    pub fn put_string(&mut self, value: &str, field: &str) -> Result<()> {
        let prefix = checked_prefix(value.len(), self.config.max_string_len, field)?;
        self.dst.reserve(LENGTH_PREFIX_SIZE + value.len());
        self.put_u32(prefix);
        self.dst.put_slice(value.as_bytes());
        Ok(())
    }

    /// Write a length-prefixed byte array (`uint8[]`).
    pub fn put_byte_vec(&mut self, value: &[u8], field: &str) -> Result<()> {
        self.put_count(value.len(), field)?;
        self.dst.put_slice(value);
        Ok(())
    }

    /// Write raw bytes with no prefix (`uint8[N]`).
    pub fn put_raw(&mut self, value: &[u8]) {
        self.dst.put_slice(value);
    }
}

/// Check a fixed-size array's element count before writing it.
pub fn check_array_len(expected: usize, found: usize, field: &str) -> Result<()> {
    if expected != found {
        return Err(CodecError::ArrayLength {
            field: field.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

fn checked_prefix(len: usize, max: usize, field: &str) -> Result<u32> {
    let max = max.min(u32::MAX as usize);
    if len > max {
        return Err(CodecError::LengthOverflow {
            field: field.to_string(),
            length: len,
            max,
        });
    }
    Ok(len as u32)
}
