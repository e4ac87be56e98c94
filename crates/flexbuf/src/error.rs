//! FlexBuffer error type.

use thiserror::Error;

use crate::types::ValueType;

/// Error type shared by the builder and the reader.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlexError {
    #[error("invalid buffer: {0}")]
    InvalidBuffer(&'static str),
    #[error("bad offset {offset} for a {width}-byte read")]
    BadOffset { offset: usize, width: usize },
    #[error("unknown value type tag {0}")]
    UnknownType(u8),
    #[error("type {actual:?} is not convertible to {requested}")]
    TypeMismatch {
        actual: ValueType,
        requested: &'static str,
    },
    #[error("index {index} out of range 0..{len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no key '{0}' could be found")]
    KeyNotFound(String),
    #[error("map keys are not in ascending order at index {0}")]
    UnsortedKeys(usize),
    #[error("invalid utf-8 in string data")]
    InvalidUtf8,
    #[error("nesting deeper than {0} levels")]
    DepthLimit(usize),
    #[error("unexpected typed vector length: {0}")]
    InvalidLength(usize),
    #[error("buffer already finished")]
    AlreadyFinished,
    #[error("unbalanced container: {0}")]
    UnbalancedContainer(&'static str),
    #[error("root must hold exactly one value, found {0}")]
    InvalidRoot(usize),
    #[error("map value added without a key")]
    MissingKey,
    #[error("key '{0}' added outside of a map")]
    KeyOutsideMap(String),
    #[error("key '{0}' has no value")]
    DanglingKey(String),
    #[error("duplicate map key '{0}'")]
    DuplicateKey(String),
    #[error("key '{0}' contains a NUL byte")]
    InvalidKey(String),
    /// Builder only; a reader meeting a narrow float reports `BadOffset`.
    #[error("floats cannot be stored in {0} bytes")]
    UnsupportedWidth(usize),
    #[error("offset {delta} does not fit in {width} bytes")]
    OffsetOverflow { delta: usize, width: usize },
}
