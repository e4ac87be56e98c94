//! [`FlxValue`]: a typed, zero-copy view of one value inside a buffer.

use std::fmt;

use super::json::{self, JsonStyle};
use super::raw;
use super::{FlxMap, FlxVector};
use crate::error::FlexError;
use crate::types::{unpack_type, ByteWidth, ValueType};

/// A value inside a FlexBuffer.
///
/// Holds the backing slice, the slot offset, the width of the slot (the
/// parent's width), the value's own width and its type. Nothing is decoded
/// until an accessor is called.
#[derive(Clone, Copy)]
pub struct FlxValue<'a> {
    buffer: &'a [u8],
    offset: usize,
    parent_width: usize,
    byte_width: usize,
    value_type: ValueType,
}

impl fmt::Debug for FlxValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlxValue")
            .field("type", &self.value_type)
            .field("offset", &self.offset)
            .field("parent_width", &self.parent_width)
            .field("byte_width", &self.byte_width)
            .finish()
    }
}

impl<'a> FlxValue<'a> {
    pub(crate) fn new(
        buffer: &'a [u8],
        offset: usize,
        parent_width: usize,
        byte_width: usize,
        value_type: ValueType,
    ) -> Self {
        Self {
            buffer,
            offset,
            parent_width,
            byte_width,
            value_type,
        }
    }

    pub(crate) fn from_packed(
        buffer: &'a [u8],
        offset: usize,
        parent_width: usize,
        packed: u8,
    ) -> Result<Self, FlexError> {
        let (value_type, width) = unpack_type(packed)?;
        Ok(Self::new(buffer, offset, parent_width, width.bytes(), value_type))
    }

    /// Root value of a sealed buffer, located through the two-byte footer.
    pub fn from_bytes(buffer: &'a [u8]) -> Result<Self, FlexError> {
        let len = buffer.len();
        if len < 3 {
            return Err(FlexError::InvalidBuffer("shorter than 3 bytes"));
        }
        let root_width = buffer[len - 1] as usize;
        if ByteWidth::from_bytes(root_width).is_none() {
            return Err(FlexError::InvalidBuffer("root width is not 1, 2, 4 or 8"));
        }
        let offset = len
            .checked_sub(root_width + 2)
            .ok_or(FlexError::InvalidBuffer("root slot out of range"))?;
        Self::from_packed(buffer, offset, root_width, buffer[len - 2])
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Absolute position of this value's slot.
    pub fn buffer_offset(&self) -> usize {
        self.offset
    }

    pub fn is_null(&self) -> bool {
        self.value_type == ValueType::Null
    }

    fn indirect(&self) -> Result<usize, FlexError> {
        raw::indirect(self.buffer, self.offset, self.parent_width)
    }

    /// Int directly, Uint only when it fits in `i64`.
    pub fn as_long(&self) -> Result<i64, FlexError> {
        let buf = self.buffer;
        match self.value_type {
            ValueType::Int => raw::read_i64(buf, self.offset, self.parent_width),
            ValueType::IndirectInt => raw::read_i64(buf, self.indirect()?, self.byte_width),
            ValueType::Uint => {
                let value = raw::read_u64(buf, self.offset, self.parent_width)?;
                i64::try_from(value).map_err(|_| self.value_type.mismatch("long"))
            }
            ValueType::IndirectUInt => {
                let value = raw::read_u64(buf, self.indirect()?, self.byte_width)?;
                i64::try_from(value).map_err(|_| self.value_type.mismatch("long"))
            }
            other => Err(other.mismatch("long")),
        }
    }

    /// Uint directly, Int only when it is not negative.
    pub fn as_ulong(&self) -> Result<u64, FlexError> {
        let buf = self.buffer;
        match self.value_type {
            ValueType::Uint => raw::read_u64(buf, self.offset, self.parent_width),
            ValueType::IndirectUInt => raw::read_u64(buf, self.indirect()?, self.byte_width),
            ValueType::Int => {
                let value = raw::read_i64(buf, self.offset, self.parent_width)?;
                u64::try_from(value).map_err(|_| self.value_type.mismatch("ulong"))
            }
            ValueType::IndirectInt => {
                let value = raw::read_i64(buf, self.indirect()?, self.byte_width)?;
                u64::try_from(value).map_err(|_| self.value_type.mismatch("ulong"))
            }
            other => Err(other.mismatch("ulong")),
        }
    }

    /// Float, and any integer widened to `f64` (large integers may round).
    pub fn as_double(&self) -> Result<f64, FlexError> {
        let buf = self.buffer;
        match self.value_type {
            ValueType::Float => raw::read_f64(buf, self.offset, self.parent_width),
            ValueType::Int => Ok(raw::read_i64(buf, self.offset, self.parent_width)? as f64),
            ValueType::Uint => Ok(raw::read_u64(buf, self.offset, self.parent_width)? as f64),
            ValueType::IndirectFloat => raw::read_f64(buf, self.indirect()?, self.byte_width),
            ValueType::IndirectInt => {
                Ok(raw::read_i64(buf, self.indirect()?, self.byte_width)? as f64)
            }
            ValueType::IndirectUInt => {
                Ok(raw::read_u64(buf, self.indirect()?, self.byte_width)? as f64)
            }
            other => Err(other.mismatch("double")),
        }
    }

    /// Bool, or a non-zero Int/Uint.
    pub fn as_bool(&self) -> Result<bool, FlexError> {
        match self.value_type {
            ValueType::Bool | ValueType::Uint => {
                Ok(raw::read_u64(self.buffer, self.offset, self.parent_width)? != 0)
            }
            ValueType::Int => Ok(raw::read_i64(self.buffer, self.offset, self.parent_width)? != 0),
            other => Err(other.mismatch("bool")),
        }
    }

    /// String or Key contents, borrowed from the buffer.
    pub fn as_str(&self) -> Result<&'a str, FlexError> {
        let bytes = match self.value_type {
            ValueType::String => self.string_bytes()?,
            ValueType::Key => self.key_bytes()?,
            other => return Err(other.mismatch("string")),
        };
        std::str::from_utf8(bytes).map_err(|_| FlexError::InvalidUtf8)
    }

    /// Bytes of a String value.
    ///
    /// The length field normally has the value's own width, but elements of
    /// typed string vectors only know the vector's width. The byte after the
    /// data must be the terminator; when it is not, the length was read too
    /// narrow and the read is retried at double the width.
    fn string_bytes(&self) -> Result<&'a [u8], FlexError> {
        let start = self.indirect()?;
        let mut width = self.byte_width;
        let mut size = raw::read_usize(self.buffer, raw::before(start, width)?, width)?;
        loop {
            let end = start
                .checked_add(size)
                .ok_or(FlexError::BadOffset { offset: start, width })?;
            match self.buffer.get(end) {
                Some(0) => return Ok(&self.buffer[start..end]),
                Some(_) if width < 8 => {
                    width <<= 1;
                    size = raw::read_usize(self.buffer, raw::before(start, width)?, width)?;
                }
                _ => return Err(FlexError::BadOffset { offset: end, width: 1 }),
            }
        }
    }

    /// Bytes of a Key: everything up to the zero terminator.
    pub(crate) fn key_bytes(&self) -> Result<&'a [u8], FlexError> {
        if self.value_type != ValueType::Key {
            return Err(self.value_type.mismatch("key"));
        }
        let start = self.indirect()?;
        let rest = self
            .buffer
            .get(start..)
            .ok_or(FlexError::BadOffset { offset: start, width: 1 })?;
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(FlexError::BadOffset { offset: start, width: 1 })?;
        Ok(&rest[..len])
    }

    pub fn as_blob(&self) -> Result<&'a [u8], FlexError> {
        if self.value_type != ValueType::Blob {
            return Err(self.value_type.mismatch("blob"));
        }
        let start = self.indirect()?;
        let size = raw::read_usize(
            self.buffer,
            raw::before(start, self.byte_width)?,
            self.byte_width,
        )?;
        start
            .checked_add(size)
            .and_then(|end| self.buffer.get(start..end))
            .ok_or(FlexError::BadOffset { offset: start, width: 1 })
    }

    pub fn as_vector(&self) -> Result<FlxVector<'a>, FlexError> {
        if !self.value_type.is_any_vector() {
            return Err(self.value_type.mismatch("vector"));
        }
        let start = self.indirect()?;
        let len = if self.value_type.is_fixed_typed_vector() {
            self.value_type.fixed_typed_vector_element_size()?
        } else {
            raw::read_usize(
                self.buffer,
                raw::before(start, self.byte_width)?,
                self.byte_width,
            )?
        };
        Ok(FlxVector::new(
            self.buffer,
            start,
            self.byte_width,
            self.value_type,
            len,
        ))
    }

    pub fn as_map(&self) -> Result<FlxMap<'a>, FlexError> {
        if self.value_type != ValueType::Map {
            return Err(self.value_type.mismatch("map"));
        }
        let start = self.indirect()?;
        let len = raw::read_usize(
            self.buffer,
            raw::before(start, self.byte_width)?,
            self.byte_width,
        )?;
        Ok(FlxMap::new(self.buffer, start, self.byte_width, len))
    }

    /// Element `index` of a vector value.
    pub fn index(&self, index: usize) -> Result<FlxValue<'a>, FlexError> {
        self.as_vector()?.get(index)
    }

    /// Value under `key` of a map value.
    pub fn get(&self, key: &str) -> Result<FlxValue<'a>, FlexError> {
        self.as_map()?.get(key)
    }

    /// Compact JSON. With `conform`, quotes, CR, LF, TAB and `/` in strings
    /// are escaped.
    pub fn to_json(&self, conform: bool) -> Result<String, FlexError> {
        json::render(*self, JsonStyle::compact(conform))
    }

    /// Indented JSON, two spaces per level.
    pub fn to_pretty_json(&self, conform: bool) -> Result<String, FlexError> {
        json::render(*self, JsonStyle::pretty(conform))
    }

    /// Compact JSON with the first `prefix_len` characters of every map key
    /// removed. String values are left whole.
    pub fn to_truncate_key_json(&self, prefix_len: usize, conform: bool) -> Result<String, FlexError> {
        json::render(*self, JsonStyle::compact(conform).truncate_keys(prefix_len))
    }

    pub fn to_truncate_key_pretty_json(
        &self,
        prefix_len: usize,
        conform: bool,
    ) -> Result<String, FlexError> {
        json::render(*self, JsonStyle::pretty(conform).truncate_keys(prefix_len))
    }
}
