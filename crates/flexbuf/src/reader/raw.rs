//! Bounds- and alignment-checked little-endian reads.
//!
//! Every read goes through [`read_u64`], which refuses offsets past the end
//! of the buffer and offsets not aligned to the read width.

use crate::error::FlexError;

#[inline]
fn bad(offset: usize, width: usize) -> FlexError {
    FlexError::BadOffset { offset, width }
}

pub(crate) fn read_u64(buf: &[u8], offset: usize, width: usize) -> Result<u64, FlexError> {
    if !matches!(width, 1 | 2 | 4 | 8) || offset % width != 0 {
        return Err(bad(offset, width));
    }
    let bytes = offset
        .checked_add(width)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| bad(offset, width))?;
    let mut word = [0u8; 8];
    word[..width].copy_from_slice(bytes);
    Ok(u64::from_le_bytes(word))
}

pub(crate) fn read_i64(buf: &[u8], offset: usize, width: usize) -> Result<i64, FlexError> {
    let raw = read_u64(buf, offset, width)?;
    let shift = 64 - width as u32 * 8;
    // Sign-extend from the top bit of the stored width.
    Ok(((raw << shift) as i64) >> shift)
}

/// Floats only exist at 4 and 8 bytes; other widths are `BadOffset`.
pub(crate) fn read_f64(buf: &[u8], offset: usize, width: usize) -> Result<f64, FlexError> {
    match width {
        4 => Ok(f32::from_bits(read_u64(buf, offset, 4)? as u32) as f64),
        8 => Ok(f64::from_bits(read_u64(buf, offset, 8)?)),
        _ => Err(bad(offset, width)),
    }
}

/// Reads a length or width field.
pub(crate) fn read_usize(buf: &[u8], offset: usize, width: usize) -> Result<usize, FlexError> {
    usize::try_from(read_u64(buf, offset, width)?).map_err(|_| bad(offset, width))
}

/// Follows the backward offset stored in the slot at `offset`.
pub(crate) fn indirect(buf: &[u8], offset: usize, width: usize) -> Result<usize, FlexError> {
    let step = read_usize(buf, offset, width)?;
    offset.checked_sub(step).ok_or_else(|| bad(offset, width))
}

/// Position of the field `width` bytes before `offset`.
#[inline]
pub(crate) fn before(offset: usize, width: usize) -> Result<usize, FlexError> {
    offset.checked_sub(width).ok_or_else(|| bad(offset, width))
}
