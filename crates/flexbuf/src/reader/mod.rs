//! Zero-copy reader over a sealed FlexBuffer.
//!
//! [`FlxValue::from_bytes`] locates the root through the footer; from there
//! [`FlxVector`] and [`FlxMap`] views borrow the same slice. No byte is
//! read until an accessor asks for it, and every read is bounds-checked.

mod json;
mod map;
mod raw;
mod value;
mod vector;

pub use json::MAX_DEPTH as MAX_JSON_DEPTH;
pub use map::{FlxMap, FlxMapIter};
pub use value::FlxValue;
pub use vector::{FlxVector, FlxVectorIter};
