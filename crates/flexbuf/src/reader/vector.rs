//! [`FlxVector`]: indexed view over any vector type.

use std::fmt;

use super::json::{self, JsonStyle};
use super::raw;
use super::FlxValue;
use crate::error::FlexError;
use crate::types::ValueType;

/// A vector inside a FlexBuffer: `len` slots of `byte_width` bytes starting
/// at `offset`. Generic vectors keep one packed type byte per element right
/// after the slots; typed vectors derive the element type from their tag.
#[derive(Clone, Copy)]
pub struct FlxVector<'a> {
    buffer: &'a [u8],
    offset: usize,
    byte_width: usize,
    value_type: ValueType,
    len: usize,
}

impl fmt::Debug for FlxVector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlxVector")
            .field("type", &self.value_type)
            .field("offset", &self.offset)
            .field("byte_width", &self.byte_width)
            .field("len", &self.len)
            .finish()
    }
}

impl<'a> FlxVector<'a> {
    pub(crate) fn new(
        buffer: &'a [u8],
        offset: usize,
        byte_width: usize,
        value_type: ValueType,
        len: usize,
    ) -> Self {
        Self {
            buffer,
            offset,
            byte_width,
            value_type,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot width in bytes.
    pub fn byte_width(&self) -> usize {
        self.byte_width
    }

    /// The vector's own type tag.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn bad_slot(&self) -> FlexError {
        FlexError::BadOffset {
            offset: self.offset,
            width: self.byte_width,
        }
    }

    pub fn get(&self, index: usize) -> Result<FlxValue<'a>, FlexError> {
        if index >= self.len {
            return Err(FlexError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        let elem = index
            .checked_mul(self.byte_width)
            .and_then(|rel| self.offset.checked_add(rel))
            .ok_or_else(|| self.bad_slot())?;
        if self.value_type.is_typed_vector() {
            let elem_type = self.value_type.typed_vector_element_type()?;
            return Ok(FlxValue::new(self.buffer, elem, self.byte_width, 1, elem_type));
        }
        if self.value_type.is_fixed_typed_vector() {
            let elem_type = self.value_type.fixed_typed_vector_element_type()?;
            return Ok(FlxValue::new(self.buffer, elem, self.byte_width, 1, elem_type));
        }
        if self.value_type == ValueType::Vector {
            let types = self
                .len
                .checked_mul(self.byte_width)
                .and_then(|rel| self.offset.checked_add(rel))
                .and_then(|start| start.checked_add(index))
                .ok_or_else(|| self.bad_slot())?;
            let packed = raw::read_u64(self.buffer, types, 1)? as u8;
            return FlxValue::from_packed(self.buffer, elem, self.byte_width, packed);
        }
        Err(self.value_type.mismatch("vector"))
    }

    pub fn iter(&self) -> FlxVectorIter<'a> {
        FlxVectorIter {
            vector: *self,
            index: 0,
        }
    }

    pub fn to_json(&self, conform: bool) -> Result<String, FlexError> {
        json::render_vector(*self, JsonStyle::compact(conform))
    }

    pub fn to_pretty_json(&self, conform: bool) -> Result<String, FlexError> {
        json::render_vector(*self, JsonStyle::pretty(conform))
    }
}

impl<'a> IntoIterator for FlxVector<'a> {
    type Item = Result<FlxValue<'a>, FlexError>;
    type IntoIter = FlxVectorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the elements of a [`FlxVector`].
pub struct FlxVectorIter<'a> {
    vector: FlxVector<'a>,
    index: usize,
}

impl<'a> Iterator for FlxVectorIter<'a> {
    type Item = Result<FlxValue<'a>, FlexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.vector.len {
            return None;
        }
        let item = self.vector.get(self.index);
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.len - self.index;
        (remaining, Some(remaining))
    }
}
