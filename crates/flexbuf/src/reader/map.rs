//! [`FlxMap`]: key lookup over a value vector and its sorted key vector.

use std::cmp::Ordering;
use std::fmt;

use super::json::{self, JsonStyle};
use super::raw;
use super::{FlxValue, FlxVector};
use crate::error::FlexError;
use crate::types::{ByteWidth, ValueType};

/// A map inside a FlexBuffer.
///
/// The values form a generic vector at `offset`. Three slots before it sit
/// the offset to the key vector and the key vector's width, followed by the
/// shared length.
#[derive(Clone, Copy)]
pub struct FlxMap<'a> {
    buffer: &'a [u8],
    offset: usize,
    byte_width: usize,
    len: usize,
}

impl fmt::Debug for FlxMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlxMap")
            .field("offset", &self.offset)
            .field("byte_width", &self.byte_width)
            .field("len", &self.len)
            .finish()
    }
}

impl<'a> FlxMap<'a> {
    pub(crate) fn new(buffer: &'a [u8], offset: usize, byte_width: usize, len: usize) -> Self {
        Self {
            buffer,
            offset,
            byte_width,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_width(&self) -> usize {
        self.byte_width
    }

    pub fn keys(&self) -> Result<FlxVector<'a>, FlexError> {
        let keys_slot = raw::before(self.offset, self.byte_width * 3)?;
        let start = raw::indirect(self.buffer, keys_slot, self.byte_width)?;
        let keys_width = raw::read_usize(self.buffer, keys_slot + self.byte_width, self.byte_width)?;
        if ByteWidth::from_bytes(keys_width).is_none() {
            return Err(FlexError::InvalidBuffer("key vector width is not 1, 2, 4 or 8"));
        }
        Ok(FlxVector::new(
            self.buffer,
            start,
            keys_width,
            ValueType::VectorKey,
            self.len,
        ))
    }

    pub fn values(&self) -> FlxVector<'a> {
        FlxVector::new(
            self.buffer,
            self.offset,
            self.byte_width,
            ValueType::Vector,
            self.len,
        )
    }

    /// Position of `key` in the sorted key vector.
    ///
    /// Binary search comparing raw UTF-8 bytes, so ordering is ordinal.
    ///
    /// On a miss the two keys around the insertion point are compared, so a
    /// corrupt map near that point fails with `UnsortedKeys` rather than
    /// hiding a present key behind `None`.
    pub fn key_index(&self, key: &str) -> Result<Option<usize>, FlexError> {
        let keys = self.keys()?;
        let key = key.as_bytes();
        let (mut low, mut high) = (0, self.len);
        while low < high {
            let mid = low + (high - low) / 2;
            match key.cmp(keys.get(mid)?.key_bytes()?) {
                Ordering::Equal => return Ok(Some(mid)),
                Ordering::Less => high = mid,
                Ordering::Greater => low = mid + 1,
            }
        }
        if self.len >= 2 {
            let next = low.clamp(1, self.len - 1);
            if keys.get(next - 1)?.key_bytes()? >= keys.get(next)?.key_bytes()? {
                return Err(FlexError::UnsortedKeys(next));
            }
        }
        Ok(None)
    }

    pub fn has_key(&self, key: &str) -> Result<bool, FlexError> {
        Ok(self.key_index(key)?.is_some())
    }

    pub fn get(&self, key: &str) -> Result<FlxValue<'a>, FlexError> {
        match self.key_index(key)? {
            Some(index) => self.values().get(index),
            None => Err(FlexError::KeyNotFound(key.to_owned())),
        }
    }

    pub fn value_by_index(&self, index: usize) -> Result<FlxValue<'a>, FlexError> {
        self.values().get(index)
    }

    pub fn key_at(&self, index: usize) -> Result<&'a str, FlexError> {
        self.keys()?.get(index)?.as_str()
    }

    /// Entries in key order. Fails on the first key that is not strictly
    /// greater than the one before it.
    pub fn iter(&self) -> FlxMapIter<'a> {
        FlxMapIter {
            map: *self,
            keys: None,
            index: 0,
            prev: None,
            failed: false,
        }
    }

    pub fn to_json(&self, conform: bool) -> Result<String, FlexError> {
        json::render_map(*self, JsonStyle::compact(conform))
    }

    pub fn to_pretty_json(&self, conform: bool) -> Result<String, FlexError> {
        json::render_map(*self, JsonStyle::pretty(conform))
    }
}

impl<'a> IntoIterator for FlxMap<'a> {
    type Item = Result<(&'a str, FlxValue<'a>), FlexError>;
    type IntoIter = FlxMapIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`FlxMap`].
pub struct FlxMapIter<'a> {
    map: FlxMap<'a>,
    keys: Option<FlxVector<'a>>,
    index: usize,
    prev: Option<&'a [u8]>,
    failed: bool,
}

impl<'a> FlxMapIter<'a> {
    /// Key and value at the current index.
    pub(crate) fn entry(&mut self) -> Result<(FlxValue<'a>, FlxValue<'a>), FlexError> {
        let keys = match self.keys {
            Some(keys) => keys,
            None => {
                let keys = self.map.keys()?;
                self.keys = Some(keys);
                keys
            }
        };
        let key = keys.get(self.index)?;
        let bytes = key.key_bytes()?;
        if let Some(prev) = self.prev {
            if prev >= bytes {
                return Err(FlexError::UnsortedKeys(self.index));
            }
        }
        self.prev = Some(bytes);
        let value = self.map.values().get(self.index)?;
        Ok((key, value))
    }

    /// Like `next`, but yields the key as a value so callers can render it.
    pub(crate) fn next_entry(&mut self) -> Option<Result<(FlxValue<'a>, FlxValue<'a>), FlexError>> {
        if self.failed || self.index >= self.map.len {
            return None;
        }
        let item = self.entry();
        self.failed = item.is_err();
        self.index += 1;
        Some(item)
    }
}

impl<'a> Iterator for FlxMapIter<'a> {
    type Item = Result<(&'a str, FlxValue<'a>), FlexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.next_entry()?;
        Some(item.and_then(|(key, value)| Ok((key.as_str()?, value))))
    }
}
