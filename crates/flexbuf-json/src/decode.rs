//! FlexBuffer to `serde_json::Value`.

use base64::Engine;
use flexbuf::{FlxMap, FlxValue, FlxVector, ValueType};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::check_depth;
use crate::error::BridgeError;
use crate::options::BridgeOptions;

/// Converts a FlexBuffer value into a JSON value.
///
/// Blobs become base64 strings and non-finite floats become `null`. With
/// [`BridgeOptions::index_key_prefix`] set, the prefix is stripped from
/// every map key and entries keep the order the prefix encodes.
pub fn flexbuf_to_json(value: FlxValue<'_>, options: &BridgeOptions) -> Result<Value, BridgeError> {
    JsonDecoder { options }.value(value, 0)
}

/// Reads the root of `bytes` and converts it with [`flexbuf_to_json`].
pub fn flexbuf_bytes_to_json(bytes: &[u8], options: &BridgeOptions) -> Result<Value, BridgeError> {
    let root = FlxValue::from_bytes(bytes)?;
    let value = flexbuf_to_json(root, options)?;
    debug!(size = bytes.len(), root_type = ?root.value_type(), "decoded flexbuffer to json");
    Ok(value)
}

struct JsonDecoder<'a> {
    options: &'a BridgeOptions,
}

impl JsonDecoder<'_> {
    fn value(&self, value: FlxValue<'_>, depth: usize) -> Result<Value, BridgeError> {
        let json = match value.value_type() {
            ValueType::Null => Value::Null,
            ValueType::Bool => Value::Bool(value.as_bool()?),
            ValueType::Int | ValueType::IndirectInt => Value::from(value.as_long()?),
            ValueType::Uint | ValueType::IndirectUInt => Value::from(value.as_ulong()?),
            ValueType::Float | ValueType::IndirectFloat => {
                Number::from_f64(value.as_double()?).map_or(Value::Null, Value::Number)
            }
            ValueType::String | ValueType::Key => Value::String(value.as_str()?.to_owned()),
            ValueType::Blob => Value::String(
                base64::engine::general_purpose::STANDARD.encode(value.as_blob()?),
            ),
            ValueType::Map => self.map(value.as_map()?, depth)?,
            _ => self.vector(value.as_vector()?, depth)?,
        };
        Ok(json)
    }

    fn vector(&self, vector: FlxVector<'_>, depth: usize) -> Result<Value, BridgeError> {
        check_depth(depth)?;
        let items = vector
            .iter()
            .map(|item| self.value(item?, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(items))
    }

    fn map(&self, map: FlxMap<'_>, depth: usize) -> Result<Value, BridgeError> {
        check_depth(depth)?;
        let mut entries = Map::new();
        for entry in map.iter() {
            let (key, item) = entry?;
            let key = match self.options.index_key_prefix {
                Some(digits) => strip_prefix(key, digits)?,
                None => key,
            };
            entries.insert(key.to_owned(), self.value(item, depth + 1)?);
        }
        Ok(Value::Object(entries))
    }
}

fn strip_prefix(key: &str, digits: usize) -> Result<&str, BridgeError> {
    key.char_indices()
        .nth(digits)
        .map(|(i, _)| &key[i..])
        .or_else(|| (key.chars().count() == digits).then_some(""))
        .ok_or_else(|| BridgeError::MissingKeyPrefix {
            key: key.to_owned(),
            digits,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_exact_prefix() {
        assert_eq!(strip_prefix("01name", 2).unwrap(), "name");
        assert_eq!(strip_prefix("01", 2).unwrap(), "");
        assert!(matches!(
            strip_prefix("1", 2),
            Err(BridgeError::MissingKeyPrefix { digits: 2, .. })
        ));
    }
}
