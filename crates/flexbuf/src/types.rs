//! Byte widths, value type tags and the packed type byte.
//!
//! A packed type byte stores the width code in its two low bits and the
//! type tag in the remaining six: `code | (tag << 2)`.

use crate::error::FlexError;

/// Storage size of a slot or offset field.
///
/// The discriminant is the width code, `log2` of the size in bytes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ByteWidth {
    #[default]
    W1 = 0,
    W2 = 1,
    W4 = 2,
    W8 = 3,
}

impl ByteWidth {
    /// Width code in `0..=3`.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Size in bytes: 1, 2, 4 or 8.
    #[inline]
    pub fn bytes(self) -> usize {
        1 << self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::W1),
            1 => Some(Self::W2),
            2 => Some(Self::W4),
            3 => Some(Self::W8),
            _ => None,
        }
    }

    pub fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(Self::W1),
            2 => Some(Self::W2),
            4 => Some(Self::W4),
            8 => Some(Self::W8),
            _ => None,
        }
    }

    /// Smallest width holding `value` as an unsigned integer.
    pub fn of_u64(value: u64) -> Self {
        if value & !0xff == 0 {
            Self::W1
        } else if value & !0xffff == 0 {
            Self::W2
        } else if value & !0xffff_ffff == 0 {
            Self::W4
        } else {
            Self::W8
        }
    }

    /// Smallest width holding `value` as a two's complement integer.
    pub fn of_i64(value: i64) -> Self {
        // Shift the sign bit out; the remaining magnitude must fit unsigned.
        let shifted = (value as u64) << 1;
        Self::of_u64(if value >= 0 { shifted } else { !shifted })
    }

    /// 4 bytes when `value` survives a round trip through `f32`, 8 otherwise.
    ///
    /// NaN never compares equal to itself, so it always takes 8 bytes.
    pub fn of_f64(value: f64) -> Self {
        if (value as f32) as f64 == value {
            Self::W4
        } else {
            Self::W8
        }
    }

    /// Smallest width holding a byte count or offset.
    #[inline]
    pub fn of_usize(value: usize) -> Self {
        Self::of_u64(value as u64)
    }
}

/// Closed set of value type tags.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null = 0,
    Int = 1,
    Uint = 2,
    Float = 3,
    Key = 4,
    String = 5,
    IndirectInt = 6,
    IndirectUInt = 7,
    IndirectFloat = 8,
    Map = 9,
    Vector = 10,
    VectorInt = 11,
    VectorUInt = 12,
    VectorFloat = 13,
    VectorKey = 14,
    VectorString = 15,
    VectorInt2 = 16,
    VectorUInt2 = 17,
    VectorFloat2 = 18,
    VectorInt3 = 19,
    VectorUInt3 = 20,
    VectorFloat3 = 21,
    VectorInt4 = 22,
    VectorUInt4 = 23,
    VectorFloat4 = 24,
    Blob = 25,
    Bool = 26,
    VectorBool = 36,
}

impl TryFrom<u8> for ValueType {
    type Error = FlexError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        use ValueType::*;
        Ok(match tag {
            0 => Null,
            1 => Int,
            2 => Uint,
            3 => Float,
            4 => Key,
            5 => String,
            6 => IndirectInt,
            7 => IndirectUInt,
            8 => IndirectFloat,
            9 => Map,
            10 => Vector,
            11 => VectorInt,
            12 => VectorUInt,
            13 => VectorFloat,
            14 => VectorKey,
            15 => VectorString,
            16 => VectorInt2,
            17 => VectorUInt2,
            18 => VectorFloat2,
            19 => VectorInt3,
            20 => VectorUInt3,
            21 => VectorFloat3,
            22 => VectorInt4,
            23 => VectorUInt4,
            24 => VectorFloat4,
            25 => Blob,
            26 => Bool,
            36 => VectorBool,
            other => return Err(FlexError::UnknownType(other)),
        })
    }
}

impl ValueType {
    #[inline]
    fn tag(self) -> u8 {
        self as u8
    }

    /// Stored directly in its slot rather than behind an offset.
    #[inline]
    pub fn is_inline(self) -> bool {
        self == Self::Bool || self.tag() <= Self::Float.tag()
    }

    /// Allowed as the element type of a homogeneous vector.
    #[inline]
    pub fn is_typed_vector_element(self) -> bool {
        self == Self::Bool || (Self::Int.tag()..=Self::String.tag()).contains(&self.tag())
    }

    #[inline]
    pub fn is_typed_vector(self) -> bool {
        self == Self::VectorBool
            || (Self::VectorInt.tag()..=Self::VectorString.tag()).contains(&self.tag())
    }

    #[inline]
    pub fn is_fixed_typed_vector(self) -> bool {
        (Self::VectorInt2.tag()..=Self::VectorFloat4.tag()).contains(&self.tag())
    }

    #[inline]
    pub fn is_any_vector(self) -> bool {
        self.is_typed_vector() || self.is_fixed_typed_vector() || self == Self::Vector
    }

    /// Vector tag for `elem` elements; `fixed_len` is 0 for a variable-length
    /// vector or 2, 3, 4 for a fixed one.
    pub fn to_typed_vector(elem: ValueType, fixed_len: usize) -> Result<ValueType, FlexError> {
        let base = match fixed_len {
            0 if elem.is_typed_vector_element() => Self::VectorInt,
            2 | 3 | 4 if elem.is_fixed_vector_element() => match fixed_len {
                2 => Self::VectorInt2,
                3 => Self::VectorInt3,
                _ => Self::VectorInt4,
            },
            _ => return Err(FlexError::InvalidLength(fixed_len)),
        };
        ValueType::try_from(elem.tag() - Self::Int.tag() + base.tag())
    }

    /// Element kinds a fixed-length vector can hold.
    #[inline]
    pub(crate) fn is_fixed_vector_element(self) -> bool {
        matches!(self, Self::Int | Self::Uint | Self::Float)
    }

    pub fn typed_vector_element_type(self) -> Result<ValueType, FlexError> {
        if !self.is_typed_vector() {
            return Err(self.mismatch("typed vector"));
        }
        ValueType::try_from(self.tag() - Self::VectorInt.tag() + Self::Int.tag())
    }

    pub fn fixed_typed_vector_element_type(self) -> Result<ValueType, FlexError> {
        if !self.is_fixed_typed_vector() {
            return Err(self.mismatch("fixed typed vector"));
        }
        let fixed = self.tag() - Self::VectorInt2.tag();
        ValueType::try_from(fixed % 3 + Self::Int.tag())
    }

    pub fn fixed_typed_vector_element_size(self) -> Result<usize, FlexError> {
        if !self.is_fixed_typed_vector() {
            return Err(self.mismatch("fixed typed vector"));
        }
        let fixed = self.tag() - Self::VectorInt2.tag();
        Ok(fixed as usize / 3 + 2)
    }

    #[inline]
    pub(crate) fn mismatch(self, requested: &'static str) -> FlexError {
        FlexError::TypeMismatch {
            actual: self,
            requested,
        }
    }
}

/// Packs a type tag and a width into one byte.
#[inline]
pub fn pack_type(value_type: ValueType, width: ByteWidth) -> u8 {
    width.code() | (value_type as u8) << 2
}

/// Splits a packed type byte back into its tag and width.
#[inline]
pub fn unpack_type(packed: u8) -> Result<(ValueType, ByteWidth), FlexError> {
    let value_type = ValueType::try_from(packed >> 2)?;
    // Two bits always map onto a width code.
    let width = ByteWidth::from_code(packed & 3).unwrap_or_default();
    Ok((value_type, width))
}
