//! flexbuf-json - bridge between `serde_json` documents and FlexBuffers.
//!
//! FlexBuffer maps are sorted by key, so a plain round trip returns objects
//! with their keys in byte order. Setting
//! [`BridgeOptions::index_key_prefix`] numbers the keys on the way in and
//! strips the numbers on the way out, which keeps document order.
//!
//! ```
//! use flexbuf_json::{flexbuf_bytes_to_json, json_str_to_flexbuf, BridgeOptions};
//!
//! let options = BridgeOptions::default().with_index_key_prefix(2);
//! let bytes = json_str_to_flexbuf(r#"{"zeta":1,"alpha":[true,null]}"#, &options)?;
//! let value = flexbuf_bytes_to_json(&bytes, &options)?;
//! assert_eq!(value.to_string(), r#"{"zeta":1,"alpha":[true,null]}"#);
//! # Ok::<(), flexbuf_json::BridgeError>(())
//! ```

mod decode;
mod encode;
mod error;
mod options;

use flexbuf::{FlexError, FlxValue, MAX_JSON_DEPTH};
use serde_json::Value;

pub use decode::{flexbuf_bytes_to_json, flexbuf_to_json};
pub use encode::{json_str_to_flexbuf, json_to_flexbuf};
pub use error::BridgeError;
pub use options::BridgeOptions;

/// Renders `value` as JSON text with object keys in document order.
///
/// The document is encoded with a `digits`-wide index prefix and doubled
/// backslashes, then rendered with `digits` characters cut from every key.
/// Escaped slashes are turned back into plain `/`.
pub fn ordered_json_text(value: &Value, digits: usize, pretty: bool) -> Result<String, BridgeError> {
    let options = BridgeOptions::default()
        .with_index_key_prefix(digits)
        .with_escape_backslashes(true);
    let bytes = json_to_flexbuf(value, &options)?;
    let root = FlxValue::from_bytes(&bytes)?;
    let text = if pretty {
        root.to_truncate_key_pretty_json(digits, true)?
    } else {
        root.to_truncate_key_json(digits, true)?
    };
    Ok(text.replace("\\/", "/"))
}

pub(crate) fn check_depth(depth: usize) -> Result<(), FlexError> {
    if depth >= MAX_JSON_DEPTH {
        Err(FlexError::DepthLimit(MAX_JSON_DEPTH))
    } else {
        Ok(())
    }
}
