//! flexbuf - schema-less binary values with zero-copy random access.
//!
//! A FlexBuffer is a flat little-endian byte sequence holding one root
//! value: a scalar, a string, a blob, or nested vectors and maps. Every
//! container picks the narrowest slot width (1, 2, 4 or 8 bytes) that fits
//! its elements, and indirect values are reached through backward offsets,
//! so a reader can jump straight to any element without parsing the rest.
//!
//! [`Builder`] writes buffers; [`FlxValue`] reads them.
//!
//! ```
//! use flexbuf::{Builder, FlxValue, ValueType};
//!
//! let mut builder = Builder::new();
//! builder.vector(|b| {
//!     b.add_int(1)?;
//!     b.add_string("x")?;
//!     b.add_bool(true)
//! })?;
//! let bytes = builder.finish()?;
//!
//! let root = FlxValue::from_bytes(&bytes)?;
//! assert_eq!(root.value_type(), ValueType::Vector);
//! assert_eq!(root.index(1)?.as_str()?, "x");
//! assert_eq!(root.to_json(true)?, r#"[1,"x",true]"#);
//! # Ok::<(), flexbuf::FlexError>(())
//! ```

mod builder;
mod error;
mod options;
mod reader;
mod stack_value;
mod types;

pub use builder::Builder;
pub use error::FlexError;
pub use options::BuilderOptions;
pub use reader::{FlxMap, FlxMapIter, FlxValue, FlxVector, FlxVectorIter, MAX_JSON_DEPTH};
pub use stack_value::{Payload, StackValue};
pub use types::{pack_type, unpack_type, ByteWidth, ValueType};
