//! `serde_json::Value` to FlexBuffer.

use std::borrow::Cow;

use flexbuf::{Builder, FlexError};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::check_depth;
use crate::error::BridgeError;
use crate::options::BridgeOptions;

/// Encodes a JSON document as a FlexBuffer.
///
/// Integers become Int when they fit `i64`, Uint otherwise; every other
/// number becomes a Float.
pub fn json_to_flexbuf(value: &Value, options: &BridgeOptions) -> Result<Vec<u8>, BridgeError> {
    let mut builder = Builder::with_options(options.builder.clone());
    let mut encoder = JsonEncoder {
        builder: &mut builder,
        options,
    };
    encoder.value(value, 0)?;
    let bytes = builder.finish()?;
    debug!(size = bytes.len(), prefix = ?options.index_key_prefix, "encoded json document");
    Ok(bytes)
}

/// Parses `text` and encodes it with [`json_to_flexbuf`].
pub fn json_str_to_flexbuf(text: &str, options: &BridgeOptions) -> Result<Vec<u8>, BridgeError> {
    let value: Value = serde_json::from_str(text)?;
    json_to_flexbuf(&value, options)
}

struct JsonEncoder<'a> {
    builder: &'a mut Builder,
    options: &'a BridgeOptions,
}

impl JsonEncoder<'_> {
    fn value(&mut self, value: &Value, depth: usize) -> Result<(), BridgeError> {
        match value {
            Value::Null => self.builder.add_null()?,
            Value::Bool(b) => self.builder.add_bool(*b)?,
            Value::Number(n) => self.number(n)?,
            Value::String(s) => {
                let s = escape(s, self.options.escape_backslashes);
                self.builder.add_string(&s)?;
            }
            Value::Array(items) => {
                check_depth(depth)?;
                self.builder.start_vector()?;
                for item in items {
                    self.value(item, depth + 1)?;
                }
                self.builder.end_vector()?;
            }
            Value::Object(entries) => {
                check_depth(depth)?;
                self.object(entries, depth)?;
            }
        }
        Ok(())
    }

    fn number(&mut self, n: &Number) -> Result<(), FlexError> {
        if let Some(v) = n.as_i64() {
            self.builder.add_int(v)
        } else if let Some(v) = n.as_u64() {
            self.builder.add_uint(v)
        } else {
            match n.as_f64() {
                Some(v) => self.builder.add_float(v),
                None => self.builder.add_null(),
            }
        }
    }

    fn object(&mut self, entries: &Map<String, Value>, depth: usize) -> Result<(), BridgeError> {
        if let Some(digits) = self.options.index_key_prefix {
            let fits = u32::try_from(digits)
                .ok()
                .and_then(|d| 10usize.checked_pow(d))
                .map_or(true, |limit| entries.len() < limit);
            if !fits {
                return Err(BridgeError::TooManyKeys {
                    len: entries.len(),
                    digits,
                });
            }
        }
        self.builder.start_map()?;
        for (i, (key, item)) in entries.iter().enumerate() {
            let key = escape(key, self.options.escape_backslashes);
            match self.options.index_key_prefix {
                Some(digits) => self.builder.key(&format!("{:0digits$}{key}", i + 1))?,
                None => self.builder.key(&key)?,
            }
            self.value(item, depth + 1)?;
        }
        self.builder.end_map()?;
        Ok(())
    }
}

fn escape(s: &str, backslashes: bool) -> Cow<'_, str> {
    if backslashes && s.contains('\\') {
        Cow::Owned(s.replace('\\', "\\\\"))
    } else {
        Cow::Borrowed(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexbuf::{FlxValue, ValueType};
    use serde_json::json;

    #[test]
    fn numbers_pick_their_type() {
        let bytes = json_to_flexbuf(&json!([1, -2, 18446744073709551615u64, 0.5]), &BridgeOptions::default())
            .unwrap();
        let root = FlxValue::from_bytes(&bytes).unwrap();
        let types: Vec<ValueType> = root
            .as_vector()
            .unwrap()
            .iter()
            .map(|v| v.unwrap().value_type())
            .collect();
        assert_eq!(
            types,
            vec![ValueType::Int, ValueType::Int, ValueType::Uint, ValueType::Float]
        );
    }

    #[test]
    fn index_prefix_is_zero_padded() {
        let options = BridgeOptions::default().with_index_key_prefix(2);
        let bytes = json_to_flexbuf(&json!({"b": 1, "a": 2}), &options).unwrap();
        let map = FlxValue::from_bytes(&bytes).unwrap().as_map().unwrap();
        assert_eq!(map.key_at(0).unwrap(), "01b");
        assert_eq!(map.key_at(1).unwrap(), "02a");
    }

    #[test]
    fn too_many_keys_for_the_prefix() {
        let options = BridgeOptions::default().with_index_key_prefix(1);
        let object: Map<String, Value> = (0..10).map(|i| (format!("k{i}"), Value::Null)).collect();
        let result = json_to_flexbuf(&Value::Object(object), &options);
        assert!(matches!(
            result,
            Err(BridgeError::TooManyKeys { len: 10, digits: 1 })
        ));
    }

    #[test]
    fn backslashes_can_be_doubled() {
        let options = BridgeOptions::default().with_escape_backslashes(true);
        let bytes = json_to_flexbuf(&json!("a\\b"), &options).unwrap();
        assert_eq!(FlxValue::from_bytes(&bytes).unwrap().as_str().unwrap(), "a\\\\b");
    }
}
