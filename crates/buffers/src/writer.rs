//! Little-endian buffer writer with auto-growing capacity and alignment.

/// An append-only binary writer that grows automatically as needed.
///
/// All multi-byte scalars are written little-endian. Unlike a plain
/// `Vec<u8>`, the writer can emit integers at a runtime-chosen width and pad
/// the output so the next write lands on a width boundary.
///
/// # Example
///
/// ```
/// use flexbuf_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.align(4);
/// writer.uint(0x0203, 2);
/// assert_eq!(writer.flush(), [0x01, 0x00, 0x00, 0x00, 0x03, 0x02]);
/// ```
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
    /// Current cursor position.
    pub x: usize,
    /// Allocation size when buffer needs to grow.
    alloc_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a new writer with default allocation size (1KB).
    pub fn new() -> Self {
        Self::with_alloc_size(1024)
    }

    /// Creates a new writer with custom allocation size.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        let alloc_size = alloc_size.max(16);
        Self {
            uint8: vec![0u8; alloc_size],
            x: 0,
            alloc_size,
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.x
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x == 0
    }

    /// The written bytes, without consuming them.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8[..self.x]
    }

    /// Ensures the buffer has at least `capacity` bytes available.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let remaining = self.uint8.len() - self.x;
        if remaining < capacity {
            let required = self.x + capacity;
            let new_size = (required * 2).max(self.alloc_size);
            self.uint8.resize(new_size, 0);
        }
    }

    /// Drops everything written and starts over, keeping the allocation.
    pub fn reset(&mut self) {
        self.uint8[..self.x].fill(0);
        self.x = 0;
    }

    /// Returns the written data and resets the writer.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[..self.x].to_vec();
        self.reset();
        result
    }

    /// Number of zero bytes needed to bring `size` up to a multiple of `width`.
    ///
    /// `width` must be a power of two.
    #[inline]
    pub fn padding(size: usize, width: usize) -> usize {
        size.wrapping_neg() & (width - 1)
    }

    /// Writes `len` zero bytes.
    pub fn pad(&mut self, len: usize) {
        self.ensure_capacity(len);
        self.uint8[self.x..self.x + len].fill(0);
        self.x += len;
    }

    /// Pads with zeros until the cursor is a multiple of `width`.
    pub fn align(&mut self, width: usize) {
        let len = Self::padding(self.x, width);
        self.pad(len);
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.ensure_capacity(1);
        self.uint8[self.x] = val;
        self.x += 1;
    }

    /// Writes the low `width` bytes of an unsigned integer (little-endian).
    #[inline]
    pub fn uint(&mut self, val: u64, width: usize) {
        debug_assert!(matches!(width, 1 | 2 | 4 | 8));
        self.ensure_capacity(width);
        let bytes = val.to_le_bytes();
        self.uint8[self.x..self.x + width].copy_from_slice(&bytes[..width]);
        self.x += width;
    }

    /// Writes the low `width` bytes of a signed integer (little-endian,
    /// two's complement).
    #[inline]
    pub fn int(&mut self, val: i64, width: usize) {
        self.uint(val as u64, width);
    }

    /// Writes a 32-bit floating point number (little-endian).
    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.ensure_capacity(4);
        self.uint8[self.x..self.x + 4].copy_from_slice(&val.to_le_bytes());
        self.x += 4;
    }

    /// Writes a 64-bit floating point number (little-endian).
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.ensure_capacity(8);
        self.uint8[self.x..self.x + 8].copy_from_slice(&val.to_le_bytes());
        self.x += 8;
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        let length = buf.len();
        self.ensure_capacity(length);
        self.uint8[self.x..self.x + length].copy_from_slice(buf);
        self.x += length;
    }

    /// Writes a UTF-8 string. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        self.buf(s.as_bytes());
        s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8() {
        let mut writer = Writer::new();
        writer.u8(0x01);
        writer.u8(0x02);
        assert_eq!(writer.flush(), [0x01, 0x02]);
    }

    #[test]
    fn test_uint_widths() {
        let mut writer = Writer::new();
        writer.uint(0x0102, 2);
        writer.uint(0x0304_0506, 4);
        assert_eq!(writer.flush(), [0x02, 0x01, 0x06, 0x05, 0x04, 0x03]);
    }

    #[test]
    fn test_uint_truncates_to_width() {
        let mut writer = Writer::new();
        writer.uint(0x1_0203, 1);
        assert_eq!(writer.flush(), [0x03]);
    }

    #[test]
    fn test_int_negative() {
        let mut writer = Writer::new();
        writer.int(-2, 1);
        writer.int(-1000, 2);
        let data = writer.flush();
        assert_eq!(data[0], 0xfe);
        assert_eq!(i16::from_le_bytes([data[1], data[2]]), -1000);
    }

    #[test]
    fn test_floats() {
        let mut writer = Writer::new();
        writer.f32(1.5);
        writer.f64(-2.25);
        let data = writer.flush();
        assert_eq!(f32::from_le_bytes(data[..4].try_into().unwrap()), 1.5);
        assert_eq!(f64::from_le_bytes(data[4..].try_into().unwrap()), -2.25);
    }

    #[test]
    fn test_padding() {
        assert_eq!(Writer::padding(0, 8), 0);
        assert_eq!(Writer::padding(1, 8), 7);
        assert_eq!(Writer::padding(5, 4), 3);
        assert_eq!(Writer::padding(6, 2), 0);
        assert_eq!(Writer::padding(7, 1), 0);
    }

    #[test]
    fn test_align() {
        let mut writer = Writer::new();
        writer.u8(0xaa);
        writer.align(4);
        assert_eq!(writer.len(), 4);
        writer.align(4);
        assert_eq!(writer.len(), 4);
        assert_eq!(writer.as_slice(), [0xaa, 0, 0, 0]);
    }

    #[test]
    fn test_grows_past_alloc_size() {
        let mut writer = Writer::with_alloc_size(16);
        for i in 0..100u8 {
            writer.u8(i);
        }
        let data = writer.flush();
        assert_eq!(data.len(), 100);
        assert_eq!(data[99], 99);
    }

    #[test]
    fn test_flush_resets() {
        let mut writer = Writer::new();
        writer.u8(0x01);
        assert_eq!(writer.flush(), [0x01]);
        assert!(writer.is_empty());
        writer.u8(0x02);
        assert_eq!(writer.flush(), [0x02]);
    }

    #[test]
    fn test_utf8() {
        let mut writer = Writer::new();
        let n = writer.utf8("café");
        let data = writer.flush();
        assert_eq!(n, data.len());
        assert_eq!(std::str::from_utf8(&data).unwrap(), "café");
    }
}
