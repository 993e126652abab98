//! Fixed-width little-endian primitives for opinion records.
//!
//! Sections in an opinion record carry no length prefixes; every boundary is
//! derived from header counts. The writer therefore only emits raw fixed-width
//! fields, and the reader is an explicit cursor that refuses to step past the
//! end of its buffer.

use crate::error::{OpinionError, Result};

/// Write-only helper that emits deterministic little-endian payloads.
#[derive(Default, Debug)]
pub struct WireWriter {
    buffer: Vec<u8>,
}

impl WireWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(if value { 1 } else { 0 });
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends raw bytes without a length prefix.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

/// Forward-only cursor over a borrowed record.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.offset
    }

    /// Splits `len` bytes off the front of the cursor.
    pub fn take(&mut self, len: usize, section: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(OpinionError::malformed(
                section,
                format!(
                    "needs {len} bytes at offset {}, only {} remain",
                    self.offset,
                    self.remaining()
                ),
            ));
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.input[start..self.offset])
    }

    pub fn read_array<const N: usize>(&mut self, section: &'static str) -> Result<[u8; N]> {
        let bytes = self.take(N, section)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self, section: &'static str) -> Result<u8> {
        Ok(self.take(1, section)?[0])
    }

    pub fn read_bool(&mut self, section: &'static str) -> Result<bool> {
        match self.read_u8(section)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(OpinionError::malformed(
                section,
                format!("invalid boolean discriminant {other}"),
            )),
        }
    }

    pub fn read_u16(&mut self, section: &'static str) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array::<2>(section)?))
    }

    pub fn read_u32(&mut self, section: &'static str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>(section)?))
    }

    pub fn read_u64(&mut self, section: &'static str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array::<8>(section)?))
    }

    /// Fails unless every byte of the input has been consumed.
    pub fn finish(self) -> Result<()> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(OpinionError::malformed(
                "record",
                format!("{} trailing bytes after offset {}", self.remaining(), self.offset),
            ))
        }
    }
}

/// Width of a count field in a record header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountWidth {
    U8,
    U16,
    U32,
}

impl CountWidth {
    pub const fn size(self) -> usize {
        match self {
            CountWidth::U8 => 1,
            CountWidth::U16 => 2,
            CountWidth::U32 => 4,
        }
    }

    pub const fn max_value(self) -> u64 {
        match self {
            CountWidth::U8 => u8::MAX as u64,
            CountWidth::U16 => u16::MAX as u64,
            CountWidth::U32 => u32::MAX as u64,
        }
    }

    /// Fails when `value` does not fit the field.
    pub fn check(self, field: &'static str, value: usize) -> Result<()> {
        let declared = value as u64;
        if declared > self.max_value() {
            return Err(OpinionError::capacity(field, declared, self.max_value()));
        }
        Ok(())
    }

    /// Writes `value`, refusing counts the field cannot represent.
    pub fn write(self, writer: &mut WireWriter, field: &'static str, value: usize) -> Result<()> {
        self.check(field, value)?;
        let value = value as u64;
        match self {
            CountWidth::U8 => writer.write_u8(value as u8),
            CountWidth::U16 => writer.write_u16(value as u16),
            CountWidth::U32 => writer.write_u32(value as u32),
        }
        Ok(())
    }

    pub fn read(self, reader: &mut WireReader<'_>, field: &'static str) -> Result<u64> {
        Ok(match self {
            CountWidth::U8 => u64::from(reader.read_u8(field)?),
            CountWidth::U16 => u64::from(reader.read_u16(field)?),
            CountWidth::U32 => u64::from(reader.read_u32(field)?),
        })
    }
}

/// Fixed-width value stored in the flattened opinion array.
pub trait OpinionScalar: Copy + PartialEq + core::fmt::Debug {
    /// Encoded width in bytes.
    const WIDTH: usize;

    fn write_wire(&self, writer: &mut WireWriter);

    fn read_wire(reader: &mut WireReader<'_>) -> Result<Self>;
}

impl OpinionScalar for u64 {
    const WIDTH: usize = 8;

    fn write_wire(&self, writer: &mut WireWriter) {
        writer.write_u64(*self);
    }

    fn read_wire(reader: &mut WireReader<'_>) -> Result<Self> {
        reader.read_u64("opinions")
    }
}

impl OpinionScalar for u8 {
    const WIDTH: usize = 1;

    fn write_wire(&self, writer: &mut WireWriter) {
        writer.write_u8(*self);
    }

    fn read_wire(reader: &mut WireReader<'_>) -> Result<Self> {
        reader.read_u8("opinions")
    }
}

impl OpinionScalar for bool {
    const WIDTH: usize = 1;

    fn write_wire(&self, writer: &mut WireWriter) {
        writer.write_bool(*self);
    }

    fn read_wire(reader: &mut WireReader<'_>) -> Result<Self> {
        reader.read_bool("opinions")
    }
}

pub(crate) fn le_bytes<T: OpinionScalar>(value: &T) -> Vec<u8> {
    let mut writer = WireWriter::with_capacity(T::WIDTH);
    value.write_wire(&mut writer);
    writer.finish()
}
