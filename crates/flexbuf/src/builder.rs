//! `Builder`: the FlexBuffer encoder.
//!
//! Values are appended to the buffer as soon as they are complete. Scalars
//! and offsets to strings, blobs and nested containers wait on a stack until
//! their parent container is closed; at that point the container picks the
//! narrowest slot width able to hold every element and every backward
//! offset, aligns itself to that width and writes its slots.
//!
//! Layouts (`w` is the container width):
//!
//! ```text
//! string   [len: w][utf-8 bytes][0]        offset points at the bytes
//! key      [utf-8 bytes][0]                no length field
//! blob     [len: w][bytes]
//! vector   [len: w][slot: w]*n[packed type: 1]*n
//! typed    [len: w][slot: w]*n             element type in the tag
//! fixed    [slot: w]*n                     length in the tag
//! map      [keys: w][keys width: w][len: w][slot: w]*n[packed type: 1]*n
//! footer   [root slot][packed root type: 1][root width: 1]
//! ```

use std::collections::HashMap;

use flexbuf_buffers::Writer;
use tracing::{debug, trace};

use crate::error::FlexError;
use crate::options::BuilderOptions;
use crate::stack_value::StackValue;
use crate::types::{ByteWidth, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Vector,
    Map,
}

/// An open container: its values live on the stack from `start` onwards.
#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    start: usize,
}

/// Append-only FlexBuffer encoder.
///
/// # Example
///
/// ```
/// use flexbuf::{Builder, FlxValue};
///
/// let mut builder = Builder::new();
/// builder.map(|b| {
///     b.key("a")?;
///     b.add_int(1)?;
///     b.key("b")?;
///     b.add_string("hello")
/// })?;
/// let bytes = builder.finish()?;
///
/// let root = FlxValue::from_bytes(&bytes)?;
/// assert_eq!(root.get("b")?.as_str()?, "hello");
/// assert_eq!(root.get("a")?.as_long()?, 1);
/// # Ok::<(), flexbuf::FlexError>(())
/// ```
pub struct Builder {
    writer: Writer,
    stack: Vec<StackValue>,
    frames: Vec<Frame>,
    strings: HashMap<String, StackValue>,
    keys: HashMap<String, usize>,
    key_vectors: HashMap<Vec<usize>, StackValue>,
    options: BuilderOptions,
    finished: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::with_options(BuilderOptions::default())
    }

    pub fn with_options(options: BuilderOptions) -> Self {
        Self {
            writer: Writer::with_alloc_size(options.initial_capacity),
            stack: Vec::new(),
            frames: Vec::new(),
            strings: HashMap::new(),
            keys: HashMap::new(),
            key_vectors: HashMap::new(),
            options,
            finished: false,
        }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Discards all state so the builder can produce another buffer.
    pub fn reset(&mut self) {
        self.writer.reset();
        self.stack.clear();
        self.frames.clear();
        self.strings.clear();
        self.keys.clear();
        self.key_vectors.clear();
        self.finished = false;
    }

    // ---- Scalars ----

    pub fn add_null(&mut self) -> Result<(), FlexError> {
        self.push(StackValue::null())
    }

    pub fn add_bool(&mut self, value: bool) -> Result<(), FlexError> {
        self.push(StackValue::bool(value))
    }

    pub fn add_int(&mut self, value: i64) -> Result<(), FlexError> {
        self.push(StackValue::int(value))
    }

    pub fn add_uint(&mut self, value: u64) -> Result<(), FlexError> {
        self.push(StackValue::uint(value))
    }

    /// Adds a float, stored in 4 bytes when that is lossless.
    pub fn add_float(&mut self, value: f64) -> Result<(), FlexError> {
        self.push(StackValue::float(value))
    }

    pub fn add_float32(&mut self, value: f32) -> Result<(), FlexError> {
        self.push(StackValue::float32(value))
    }

    // ---- Indirect data ----

    /// Adds a string; identical strings share one copy when
    /// [`BuilderOptions::share_strings`] is on.
    pub fn add_string(&mut self, value: &str) -> Result<(), FlexError> {
        self.before_value()?;
        if self.options.share_strings {
            if let Some(shared) = self.strings.get(value) {
                trace!(len = value.len(), "reusing string");
                self.stack.push(*shared);
                return Ok(());
            }
        }
        let string = self.write_sized(value.as_bytes(), true, ValueType::String);
        if self.options.share_strings {
            self.strings.insert(value.to_owned(), string);
        }
        self.stack.push(string);
        Ok(())
    }

    pub fn add_blob(&mut self, value: &[u8]) -> Result<(), FlexError> {
        self.before_value()?;
        let blob = self.write_sized(value, false, ValueType::Blob);
        self.stack.push(blob);
        Ok(())
    }

    pub fn add_indirect_int(&mut self, value: i64) -> Result<(), FlexError> {
        self.before_value()?;
        let width = ByteWidth::of_i64(value);
        self.writer.align(width.bytes());
        let loc = self.writer.len();
        self.writer.int(value, width.bytes());
        self.stack
            .push(StackValue::offset(loc, width, ValueType::IndirectInt));
        Ok(())
    }

    pub fn add_indirect_uint(&mut self, value: u64) -> Result<(), FlexError> {
        self.before_value()?;
        let width = ByteWidth::of_u64(value);
        self.writer.align(width.bytes());
        let loc = self.writer.len();
        self.writer.uint(value, width.bytes());
        self.stack
            .push(StackValue::offset(loc, width, ValueType::IndirectUInt));
        Ok(())
    }

    pub fn add_indirect_float(&mut self, value: f64) -> Result<(), FlexError> {
        self.before_value()?;
        let width = ByteWidth::of_f64(value);
        self.writer.align(width.bytes());
        let loc = self.writer.len();
        if width == ByteWidth::W4 {
            self.writer.f32(value as f32);
        } else {
            self.writer.f64(value);
        }
        self.stack
            .push(StackValue::offset(loc, width, ValueType::IndirectFloat));
        Ok(())
    }

    // ---- Containers ----

    /// Sets the key of the next value added to the innermost open map.
    pub fn key(&mut self, key: &str) -> Result<(), FlexError> {
        self.check_open()?;
        let start = match self.frames.last() {
            Some(Frame {
                kind: FrameKind::Map,
                start,
            }) => *start,
            _ => return Err(FlexError::KeyOutsideMap(key.to_owned())),
        };
        if (self.stack.len() - start) % 2 == 1 {
            return Err(FlexError::DanglingKey(self.pending_key()));
        }
        if key.as_bytes().contains(&0) {
            return Err(FlexError::InvalidKey(key.to_owned()));
        }
        let loc = self.write_key(key);
        self.stack
            .push(StackValue::offset(loc, ByteWidth::W1, ValueType::Key));
        Ok(())
    }

    pub fn start_vector(&mut self) -> Result<(), FlexError> {
        self.before_value()?;
        self.frames.push(Frame {
            kind: FrameKind::Vector,
            start: self.stack.len(),
        });
        Ok(())
    }

    pub fn end_vector(&mut self) -> Result<(), FlexError> {
        self.check_open()?;
        let start = self.close_frame(FrameKind::Vector)?;
        let len = self.stack.len() - start;
        let (typed, fixed) = self.vector_shape(start);
        let vector = self.create_vector(start, len, 1, typed, fixed, None)?;
        self.stack.truncate(start);
        self.stack.push(vector);
        Ok(())
    }

    pub fn start_map(&mut self) -> Result<(), FlexError> {
        self.before_value()?;
        self.frames.push(Frame {
            kind: FrameKind::Map,
            start: self.stack.len(),
        });
        Ok(())
    }

    /// Closes the innermost map, writing its entries sorted by key bytes.
    pub fn end_map(&mut self) -> Result<(), FlexError> {
        self.check_open()?;
        if let Some(Frame {
            kind: FrameKind::Map,
            start,
        }) = self.frames.last()
        {
            if (self.stack.len() - start) % 2 == 1 {
                return Err(FlexError::DanglingKey(self.pending_key()));
            }
        }
        let start = self.close_frame(FrameKind::Map)?;
        let len = (self.stack.len() - start) / 2;
        self.sort_entries(start)?;
        let keys = self.key_vector(start, len)?;
        let map = self.create_vector(start + 1, len, 2, false, false, Some(keys))?;
        self.stack.truncate(start);
        self.stack.push(map);
        Ok(())
    }

    /// Runs `f` inside a vector: `start_vector`, `f`, `end_vector`.
    pub fn vector<F>(&mut self, f: F) -> Result<(), FlexError>
    where
        F: FnOnce(&mut Self) -> Result<(), FlexError>,
    {
        self.start_vector()?;
        f(self)?;
        self.end_vector()
    }

    /// Runs `f` inside a map: `start_map`, `f`, `end_map`.
    pub fn map<F>(&mut self, f: F) -> Result<(), FlexError>
    where
        F: FnOnce(&mut Self) -> Result<(), FlexError>,
    {
        self.start_map()?;
        f(self)?;
        self.end_map()
    }

    /// Seals the buffer and hands it to the caller.
    pub fn finish(&mut self) -> Result<Vec<u8>, FlexError> {
        self.check_open()?;
        if !self.frames.is_empty() {
            return Err(FlexError::UnbalancedContainer("finish with open containers"));
        }
        if self.stack.len() != 1 {
            return Err(FlexError::InvalidRoot(self.stack.len()));
        }
        let root = self.stack[0];
        let width = root.elem_width(self.writer.len(), 0)?;
        self.writer.align(width.bytes());
        self.write_any(root, width)?;
        self.writer.u8(root.stored_packed_type(ByteWidth::W1));
        self.writer.u8(width.bytes() as u8);
        self.finished = true;
        let bytes = self.writer.flush();
        debug!(
            size = bytes.len(),
            root_type = ?root.value_type,
            root_width = width.bytes(),
            "flexbuffer finished"
        );
        Ok(bytes)
    }

    // ---- Internals ----

    fn check_open(&self) -> Result<(), FlexError> {
        if self.finished {
            Err(FlexError::AlreadyFinished)
        } else {
            Ok(())
        }
    }

    /// Checks that a value may be added to the current container.
    fn before_value(&self) -> Result<(), FlexError> {
        self.check_open()?;
        match self.frames.last() {
            None if !self.stack.is_empty() => Err(FlexError::InvalidRoot(self.stack.len() + 1)),
            Some(Frame {
                kind: FrameKind::Map,
                start,
            }) if (self.stack.len() - start) % 2 == 0 => Err(FlexError::MissingKey),
            _ => Ok(()),
        }
    }

    fn push(&mut self, value: StackValue) -> Result<(), FlexError> {
        self.before_value()?;
        self.stack.push(value);
        Ok(())
    }

    fn close_frame(&mut self, kind: FrameKind) -> Result<usize, FlexError> {
        match self.frames.last() {
            Some(frame) if frame.kind == kind => {
                let start = frame.start;
                self.frames.pop();
                Ok(start)
            }
            _ => Err(FlexError::UnbalancedContainer(match kind {
                FrameKind::Vector => "end_vector without matching start_vector",
                FrameKind::Map => "end_map without matching start_map",
            })),
        }
    }

    /// Writes a length-prefixed byte run and returns an offset to its data.
    fn write_sized(&mut self, data: &[u8], terminate: bool, value_type: ValueType) -> StackValue {
        let width = ByteWidth::of_usize(data.len());
        self.writer.align(width.bytes());
        self.writer.uint(data.len() as u64, width.bytes());
        let loc = self.writer.len();
        self.writer.buf(data);
        if terminate {
            self.writer.u8(0);
        }
        StackValue::offset(loc, width, value_type)
    }

    fn write_key(&mut self, key: &str) -> usize {
        if self.options.share_keys {
            if let Some(&loc) = self.keys.get(key) {
                trace!(key, "reusing key");
                return loc;
            }
        }
        let loc = self.writer.len();
        self.writer.utf8(key);
        self.writer.u8(0);
        if self.options.share_keys {
            self.keys.insert(key.to_owned(), loc);
        }
        loc
    }

    fn pending_key(&self) -> String {
        let loc = self.stack.last().map(StackValue::location).unwrap_or_default();
        String::from_utf8_lossy(key_bytes(self.writer.as_slice(), loc)).into_owned()
    }

    /// Whether the vector starting at `start` can be typed, and fixed.
    ///
    /// Strings stay generic: a typed slot cannot record the width of each
    /// string's length field, and guessing it by doubling breaks on
    /// embedded NULs.
    fn vector_shape(&self, start: usize) -> (bool, bool) {
        if !self.options.typed_vectors {
            return (false, false);
        }
        let elems = &self.stack[start..];
        let Some(first) = elems.first() else {
            return (false, false);
        };
        let value_type = first.value_type;
        if !value_type.is_typed_vector_element()
            || value_type == ValueType::String
            || elems.iter().any(|e| e.value_type != value_type)
        {
            return (false, false);
        }
        let fixed = matches!(elems.len(), 2..=4) && value_type.is_fixed_vector_element();
        (true, fixed)
    }

    /// Sorts the key/value pairs from `start` by key bytes.
    fn sort_entries(&mut self, start: usize) -> Result<(), FlexError> {
        let buf = self.writer.as_slice();
        let mut entries: Vec<(StackValue, StackValue)> = self.stack[start..]
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        entries.sort_by(|a, b| key_bytes(buf, a.0.location()).cmp(key_bytes(buf, b.0.location())));
        for pair in entries.windows(2) {
            let key = key_bytes(buf, pair[0].0.location());
            if key == key_bytes(buf, pair[1].0.location()) {
                return Err(FlexError::DuplicateKey(
                    String::from_utf8_lossy(key).into_owned(),
                ));
            }
        }
        for (i, (key, value)) in entries.into_iter().enumerate() {
            self.stack[start + i * 2] = key;
            self.stack[start + i * 2 + 1] = value;
        }
        Ok(())
    }

    fn key_vector(&mut self, start: usize, len: usize) -> Result<StackValue, FlexError> {
        if !self.options.share_key_vectors {
            return self.create_vector(start, len, 2, true, false, None);
        }
        let locations: Vec<usize> = self.stack[start..]
            .iter()
            .step_by(2)
            .map(StackValue::location)
            .collect();
        if let Some(shared) = self.key_vectors.get(&locations) {
            trace!(len, "reusing key vector");
            return Ok(*shared);
        }
        let keys = self.create_vector(start, len, 2, true, false, None)?;
        self.key_vectors.insert(locations, keys);
        Ok(keys)
    }

    /// Writes every `step`-th stack value from `start` as one container.
    fn create_vector(
        &mut self,
        start: usize,
        len: usize,
        step: usize,
        typed: bool,
        fixed: bool,
        keys: Option<StackValue>,
    ) -> Result<StackValue, FlexError> {
        let mut width = ByteWidth::of_usize(len);
        let mut prefix_elems = 1;
        if let Some(keys) = keys {
            width = width.max(keys.elem_width(self.writer.len(), 0)?);
            prefix_elems += 2;
        }
        let mut elem_type = ValueType::Key;
        // `start` may sit one past the end for an empty map's values.
        for (n, value) in self.stack.iter().skip(start).step_by(step).enumerate() {
            width = width.max(value.elem_width(self.writer.len(), n + prefix_elems)?);
            if typed {
                if n == 0 {
                    elem_type = value.value_type;
                } else if value.value_type != elem_type {
                    return Err(value.value_type.mismatch("typed vector element"));
                }
            }
        }

        let bytes = width.bytes();
        self.writer.align(bytes);
        if let Some(keys) = keys {
            self.write_offset(keys.location(), bytes)?;
            self.writer.uint(keys.width.bytes() as u64, bytes);
        }
        if !fixed {
            self.writer.uint(len as u64, bytes);
        }
        let loc = self.writer.len();
        for i in (start..self.stack.len()).step_by(step) {
            let value = self.stack[i];
            self.write_any(value, width)?;
        }
        if !typed {
            for i in (start..self.stack.len()).step_by(step) {
                let packed = self.stack[i].stored_packed_type(width);
                self.writer.u8(packed);
            }
        }

        let value_type = if keys.is_some() {
            ValueType::Map
        } else if typed {
            ValueType::to_typed_vector(elem_type, if fixed { len } else { 0 })?
        } else {
            ValueType::Vector
        };
        Ok(StackValue::offset(loc, width, value_type))
    }

    fn write_any(&mut self, value: StackValue, width: ByteWidth) -> Result<(), FlexError> {
        let bytes = width.bytes();
        match value.value_type {
            ValueType::Null => self.writer.uint(0, bytes),
            ValueType::Bool | ValueType::Int => self.writer.int(value.payload.as_i64(), bytes),
            ValueType::Uint => self.writer.uint(value.payload.as_u64(), bytes),
            ValueType::Float => match width {
                ByteWidth::W4 => self.writer.f32(value.payload.as_f64() as f32),
                ByteWidth::W8 => self.writer.f64(value.payload.as_f64()),
                _ => return Err(FlexError::UnsupportedWidth(bytes)),
            },
            _ => self.write_offset(value.location(), bytes)?,
        }
        Ok(())
    }

    /// Writes the backward distance from the current position to `loc`.
    fn write_offset(&mut self, loc: usize, bytes: usize) -> Result<(), FlexError> {
        let delta = self.writer.len() - loc;
        if bytes < 8 && (delta as u64) >> (bytes * 8) != 0 {
            return Err(FlexError::OffsetOverflow {
                delta,
                width: bytes,
            });
        }
        self.writer.uint(delta as u64, bytes);
        Ok(())
    }
}

/// Bytes of the zero-terminated key written at `loc`.
fn key_bytes(buf: &[u8], loc: usize) -> &[u8] {
    let rest = buf.get(loc..).unwrap_or_default();
    let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    &rest[..end]
}
