//! Transient values held by the builder while a container is open.

use flexbuf_buffers::Writer;

use crate::error::FlexError;
use crate::types::{pack_type, ByteWidth, ValueType};

/// Payload of a [`StackValue`].
///
/// Offsets to data written earlier use `UInt` with the absolute position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Payload {
    #[inline]
    pub fn as_i64(self) -> i64 {
        match self {
            Payload::Int(v) => v,
            Payload::UInt(v) => v as i64,
            Payload::Float(v) => v as i64,
        }
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        match self {
            Payload::Int(v) => v as u64,
            Payload::UInt(v) => v,
            Payload::Float(v) => v as u64,
        }
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            Payload::Int(v) => v as f64,
            Payload::UInt(v) => v as f64,
            Payload::Float(v) => v,
        }
    }
}

/// A scalar or an offset waiting for its parent container to be written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackValue {
    pub payload: Payload,
    /// Natural width of the value, or of the indirect data's own fields.
    pub width: ByteWidth,
    pub value_type: ValueType,
}

impl StackValue {
    pub fn null() -> Self {
        Self {
            payload: Payload::Int(0),
            width: ByteWidth::W1,
            value_type: ValueType::Null,
        }
    }

    pub fn bool(value: bool) -> Self {
        Self {
            payload: Payload::Int(value as i64),
            width: ByteWidth::W1,
            value_type: ValueType::Bool,
        }
    }

    pub fn int(value: i64) -> Self {
        Self {
            payload: Payload::Int(value),
            width: ByteWidth::of_i64(value),
            value_type: ValueType::Int,
        }
    }

    pub fn uint(value: u64) -> Self {
        Self {
            payload: Payload::UInt(value),
            width: ByteWidth::of_u64(value),
            value_type: ValueType::Uint,
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            payload: Payload::Float(value),
            width: ByteWidth::of_f64(value),
            value_type: ValueType::Float,
        }
    }

    pub fn float32(value: f32) -> Self {
        Self {
            payload: Payload::Float(value as f64),
            width: ByteWidth::W4,
            value_type: ValueType::Float,
        }
    }

    /// Reference to indirect data starting at absolute position `loc`.
    pub fn offset(loc: usize, width: ByteWidth, value_type: ValueType) -> Self {
        debug_assert!(!value_type.is_inline());
        Self {
            payload: Payload::UInt(loc as u64),
            width,
            value_type,
        }
    }

    #[inline]
    pub fn is_offset(&self) -> bool {
        !self.value_type.is_inline()
    }

    /// Absolute position of the referenced data; 0 for inline values.
    #[inline]
    pub fn location(&self) -> usize {
        match self.payload {
            Payload::UInt(loc) if self.is_offset() => loc as usize,
            _ => 0,
        }
    }

    /// Width this value occupies inside a container of `parent` width.
    ///
    /// Inline scalars widen to the container; offsets keep the width of the
    /// data they point at.
    pub fn stored_width(&self, parent: ByteWidth) -> ByteWidth {
        if self.value_type.is_inline() {
            self.width.max(parent)
        } else {
            self.width
        }
    }

    pub fn stored_packed_type(&self, parent: ByteWidth) -> u8 {
        pack_type(self.value_type, self.stored_width(parent))
    }

    /// Width the slot at `elem_index` of a container that would start at
    /// `buf_size` needs to hold this value.
    ///
    /// For offsets, tries each width in turn: the slot position depends on
    /// the width (through alignment and stride), so the first width able to
    /// hold its own backward delta wins.
    pub fn elem_width(&self, buf_size: usize, elem_index: usize) -> Result<ByteWidth, FlexError> {
        if !self.is_offset() {
            return Ok(self.width);
        }
        let loc = self.location();
        for width in [ByteWidth::W1, ByteWidth::W2, ByteWidth::W4, ByteWidth::W8] {
            let bytes = width.bytes();
            let slot = buf_size + Writer::padding(buf_size, bytes) + elem_index * bytes;
            let delta = slot - loc;
            if ByteWidth::of_usize(delta) <= width {
                return Ok(width);
            }
        }
        Err(FlexError::OffsetOverflow {
            delta: buf_size - loc,
            width: 8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_widths() {
        assert_eq!(StackValue::int(-200).width, ByteWidth::W2);
        assert_eq!(StackValue::uint(200).width, ByteWidth::W1);
        assert_eq!(StackValue::float(0.25).width, ByteWidth::W4);
        assert_eq!(StackValue::float(0.1).width, ByteWidth::W8);
        assert_eq!(StackValue::float32(0.1).width, ByteWidth::W4);
        assert_eq!(StackValue::bool(true).payload, Payload::Int(1));
    }

    #[test]
    fn inline_values_widen_to_parent() {
        let v = StackValue::int(1);
        assert_eq!(v.stored_width(ByteWidth::W4), ByteWidth::W4);
        assert_eq!(v.stored_packed_type(ByteWidth::W4), (1 << 2) | 2);
        let wide = StackValue::int(i64::MAX);
        assert_eq!(wide.stored_width(ByteWidth::W1), ByteWidth::W8);
    }

    #[test]
    fn offsets_keep_their_width() {
        let v = StackValue::offset(0, ByteWidth::W2, ValueType::String);
        assert!(v.is_offset());
        assert_eq!(v.stored_width(ByteWidth::W8), ByteWidth::W2);
        assert_eq!(v.stored_packed_type(ByteWidth::W8), (5 << 2) | 1);
    }

    #[test]
    fn elem_width_picks_smallest_fitting_slot() {
        let near = StackValue::offset(10, ByteWidth::W1, ValueType::String);
        assert_eq!(near.elem_width(16, 0), Ok(ByteWidth::W1));

        let far = StackValue::offset(0, ByteWidth::W1, ValueType::String);
        assert_eq!(far.elem_width(300, 0), Ok(ByteWidth::W2));

        // A later slot index pushes the delta over the one-byte limit.
        let edge = StackValue::offset(0, ByteWidth::W1, ValueType::Key);
        assert_eq!(edge.elem_width(250, 0), Ok(ByteWidth::W1));
        assert_eq!(edge.elem_width(250, 10), Ok(ByteWidth::W2));
    }

    #[test]
    fn elem_width_of_inline_is_natural_width() {
        assert_eq!(StackValue::int(70_000).elem_width(1_000_000, 3), Ok(ByteWidth::W4));
    }
}
