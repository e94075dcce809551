use std::fmt;

use crate::error::{FormatError, FormatResult};

/// Length-prefixed engine string.
///
/// The sign of the stored length picks the encoding: positive lengths are
/// single-byte text, negative lengths are UTF-16 code units. Both include a
/// trailing NUL. The chosen encoding is kept so a decoded string re-encodes
/// to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FString {
    pub value: Option<String>,
    pub wide: bool,
}

impl FString {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let wide = !value.is_ascii();
        Self {
            value: Some(value),
            wide,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    /// Number of bytes this string occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match &self.value {
            None => 4,
            Some(s) if self.wide => 4 + (s.encode_utf16().count() + 1) * 2,
            Some(s) => 4 + s.chars().count() + 1,
        }
    }
}

impl fmt::Display for FString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.0.chunks(4) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            write!(f, "{word:08X}")?;
        }
        Ok(())
    }
}

/// Little-endian reader over an in-memory buffer.
///
/// `base` is the absolute offset of `bytes[0]` inside the outermost stream and
/// only feeds diagnostics. Seeks are relative to this reader's own start.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            base: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Absolute offset of the cursor, for error messages.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    pub fn seek_to(&mut self, pos: usize) -> FormatResult<()> {
        if pos > self.bytes.len() {
            return Err(FormatError::TruncatedInput {
                offset: self.base + pos,
                needed: pos - self.bytes.len(),
                remaining: 0,
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> FormatResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(FormatError::TruncatedInput {
                offset: self.offset(),
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_rest(&mut self) -> &'a [u8] {
        let out = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        out
    }

    /// Split off the next `n` bytes as an independent reader.
    pub fn window(&mut self, n: usize) -> FormatResult<ByteReader<'a>> {
        let base = self.offset();
        let bytes = self.read_bytes(n)?;
        Ok(ByteReader { bytes, pos: 0, base })
    }

    fn read_array<const N: usize>(&mut self) -> FormatResult<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> FormatResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> FormatResult<i8> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> FormatResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> FormatResult<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> FormatResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> FormatResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> FormatResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> FormatResult<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> FormatResult<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> FormatResult<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    pub fn read_bool(&mut self) -> FormatResult<bool> {
        let offset = self.offset();
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(FormatError::layout(
                offset,
                format!("boolean byte {other} is neither 0 nor 1"),
            )),
        }
    }

    pub fn read_guid(&mut self) -> FormatResult<Guid> {
        Ok(Guid(self.read_array()?))
    }

    /// Count prefix for a sequence; rejects counts the remaining input cannot
    /// possibly hold so a corrupt count fails fast instead of allocating.
    pub fn read_count(&mut self, min_element_size: usize) -> FormatResult<usize> {
        let offset = self.offset();
        let count = self.read_i32()?;
        if count < 0 {
            return Err(FormatError::layout(offset, format!("negative count {count}")));
        }
        let count = count as usize;
        if count.saturating_mul(min_element_size) > self.remaining() {
            return Err(FormatError::TruncatedInput {
                offset,
                needed: count.saturating_mul(min_element_size),
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    pub fn read_fstring(&mut self) -> FormatResult<FString> {
        let offset = self.offset();
        let len = self.read_i32()?;
        if len == 0 {
            return Ok(FString::none());
        }

        if len > 0 {
            let raw = self.read_bytes(len as usize)?;
            let (text, nul) = raw.split_at(raw.len() - 1);
            if nul[0] != 0 {
                return Err(FormatError::InvalidString {
                    offset,
                    reason: "narrow string is not NUL-terminated",
                });
            }
            return Ok(FString {
                value: Some(text.iter().map(|&b| char::from(b)).collect()),
                wide: false,
            });
        }

        let units = len.unsigned_abs() as usize;
        let raw = self.read_bytes(units * 2)?;
        let mut code_units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        if code_units.pop() != Some(0) {
            return Err(FormatError::InvalidString {
                offset,
                reason: "wide string is not NUL-terminated",
            });
        }
        let text = String::from_utf16(&code_units).map_err(|_| FormatError::InvalidString {
            offset,
            reason: "wide string is not valid UTF-16",
        })?;
        Ok(FString {
            value: Some(text),
            wide: true,
        })
    }
}

/// A 4- or 8-byte field whose value is only known after later bytes are
/// written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    offset: usize,
    width: usize,
}

/// An open length field: the slot plus where the measured region starts.
#[derive(Debug, Clone, Copy)]
#[must_use = "a length scope must be closed with ByteWriter::end_length"]
pub struct LengthScope {
    slot: Slot,
    start: usize,
}

/// Little-endian writer with a post-pass patch list.
///
/// Placeholders are written as zeroes and recorded. Their final values are
/// queued as patches and applied once by [`ByteWriter::into_bytes`], so a
/// failure while encoding a later sibling can never leave a half-patched
/// buffer behind.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    patches: Vec<(Slot, u64)>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    pub fn write_guid(&mut self, guid: &Guid) {
        self.write_bytes(&guid.0);
    }

    pub fn write_count(&mut self, count: usize) -> FormatResult<()> {
        let count = i32::try_from(count).map_err(|_| FormatError::LengthOverflow { length: count })?;
        self.write_i32(count);
        Ok(())
    }

    pub fn write_fstring(&mut self, s: &FString) -> FormatResult<()> {
        let Some(text) = &s.value else {
            self.write_i32(0);
            return Ok(());
        };

        if s.wide {
            let mut units: Vec<u16> = text.encode_utf16().collect();
            units.push(0);
            let len = i32::try_from(units.len())
                .map_err(|_| FormatError::LengthOverflow { length: units.len() })?;
            self.write_i32(-len);
            for unit in units {
                self.write_u16(unit);
            }
            return Ok(());
        }

        let mut bytes = Vec::with_capacity(text.len() + 1);
        for ch in text.chars() {
            let code = u32::from(ch);
            if code > 0xFF {
                return Err(FormatError::InvalidString {
                    offset: self.position(),
                    reason: "narrow string holds a character outside Latin-1",
                });
            }
            bytes.push(code as u8);
        }
        bytes.push(0);
        let len =
            i32::try_from(bytes.len()).map_err(|_| FormatError::LengthOverflow { length: bytes.len() })?;
        self.write_i32(len);
        self.write_bytes(&bytes);
        Ok(())
    }

    pub fn reserve_u32(&mut self) -> Slot {
        let slot = Slot {
            offset: self.position(),
            width: 4,
        };
        self.write_u32(0);
        slot
    }

    pub fn reserve_u64(&mut self) -> Slot {
        let slot = Slot {
            offset: self.position(),
            width: 8,
        };
        self.write_u64(0);
        slot
    }

    pub fn patch_u32(&mut self, slot: Slot, value: u32) {
        self.patches.push((slot, u64::from(value)));
    }

    pub fn patch_i32(&mut self, slot: Slot, value: i32) {
        self.patches.push((slot, u64::from(value as u32)));
    }

    pub fn patch_i64(&mut self, slot: Slot, value: i64) {
        self.patches.push((slot, value as u64));
    }

    /// Open a 4-byte length field measuring everything written until the
    /// matching [`ByteWriter::end_length`].
    pub fn begin_length(&mut self) -> LengthScope {
        let slot = self.reserve_u32();
        LengthScope {
            slot,
            start: self.position(),
        }
    }

    /// Close a length field and return the measured byte count.
    pub fn end_length(&mut self, scope: LengthScope) -> FormatResult<u32> {
        let length = self.position() - scope.start;
        let value = u32::try_from(length).map_err(|_| FormatError::LengthOverflow { length })?;
        self.patch_u32(scope.slot, value);
        Ok(value)
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        for (slot, value) in self.patches.drain(..) {
            let bytes = value.to_le_bytes();
            self.buf[slot.offset..slot.offset + slot.width].copy_from_slice(&bytes[..slot.width]);
        }
        self.buf
    }
}
