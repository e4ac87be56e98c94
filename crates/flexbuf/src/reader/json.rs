//! JSON text rendering of reader views.
//!
//! Four flavours share one renderer: compact or pretty, each optionally
//! stripping a fixed number of leading characters from every key. Pretty
//! output indents by two spaces and separates keys from values with
//! `" : "`, or `": "` when keys are truncated.

use std::fmt::Write as _;

use base64::Engine;

use super::{FlxMap, FlxValue, FlxVector};
use crate::error::FlexError;
use crate::types::ValueType;

/// Deepest container nesting the renderer will follow.
pub const MAX_DEPTH: usize = 256;

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy)]
pub(crate) struct JsonStyle {
    conform: bool,
    pretty: bool,
    truncate_key: Option<usize>,
}

impl JsonStyle {
    pub(crate) fn compact(conform: bool) -> Self {
        Self {
            conform,
            pretty: false,
            truncate_key: None,
        }
    }

    pub(crate) fn pretty(conform: bool) -> Self {
        Self {
            pretty: true,
            ..Self::compact(conform)
        }
    }

    pub(crate) fn truncate_keys(self, prefix_len: usize) -> Self {
        Self {
            truncate_key: Some(prefix_len),
            ..self
        }
    }

    fn separator(&self) -> &'static str {
        match (self.pretty, self.truncate_key) {
            (false, _) => ":",
            (true, None) => " : ",
            (true, Some(_)) => ": ",
        }
    }
}

pub(crate) fn render(value: FlxValue<'_>, style: JsonStyle) -> Result<String, FlexError> {
    let mut renderer = Renderer::new(style);
    renderer.value(value, "", false, 0)?;
    Ok(renderer.out)
}

pub(crate) fn render_vector(vector: FlxVector<'_>, style: JsonStyle) -> Result<String, FlexError> {
    let mut renderer = Renderer::new(style);
    renderer.vector(vector, "", false, 0)?;
    Ok(renderer.out)
}

pub(crate) fn render_map(map: FlxMap<'_>, style: JsonStyle) -> Result<String, FlexError> {
    let mut renderer = Renderer::new(style);
    renderer.map(map, "", false, 0)?;
    Ok(renderer.out)
}

struct Renderer {
    style: JsonStyle,
    out: String,
}

impl Renderer {
    fn new(style: JsonStyle) -> Self {
        Self {
            style,
            out: String::new(),
        }
    }

    /// `left` is the indentation of the current line; `children_only`
    /// means the caller already wrote it (map values follow their key).
    fn value(
        &mut self,
        value: FlxValue<'_>,
        left: &str,
        children_only: bool,
        depth: usize,
    ) -> Result<(), FlexError> {
        let value_type = value.value_type();
        if value_type == ValueType::Map {
            return self.map(value.as_map()?, left, children_only, depth);
        }
        if value_type.is_any_vector() {
            return self.vector(value.as_vector()?, left, children_only, depth);
        }
        if self.style.pretty && !children_only {
            self.out.push_str(left);
        }
        self.scalar(value)
    }

    fn vector(
        &mut self,
        vector: FlxVector<'_>,
        left: &str,
        children_only: bool,
        depth: usize,
    ) -> Result<(), FlexError> {
        if depth >= MAX_DEPTH {
            return Err(FlexError::DepthLimit(MAX_DEPTH));
        }
        let len = vector.len();
        if !self.style.pretty {
            self.out.push('[');
            for (i, item) in vector.iter().enumerate() {
                if i > 0 {
                    self.out.push(',');
                }
                self.value(item?, "", false, depth + 1)?;
            }
            self.out.push(']');
            return Ok(());
        }
        if !children_only {
            self.out.push_str(left);
        }
        self.out.push_str("[\n");
        let inner = format!("{left}{INDENT}");
        for (i, item) in vector.iter().enumerate() {
            self.value(item?, &inner, false, depth + 1)?;
            if i + 1 < len {
                self.out.push(',');
            }
            self.out.push('\n');
        }
        self.out.push_str(left);
        self.out.push(']');
        Ok(())
    }

    fn map(
        &mut self,
        map: FlxMap<'_>,
        left: &str,
        children_only: bool,
        depth: usize,
    ) -> Result<(), FlexError> {
        if depth >= MAX_DEPTH {
            return Err(FlexError::DepthLimit(MAX_DEPTH));
        }
        let len = map.len();
        let separator = self.style.separator();
        let mut entries = map.iter();
        if !self.style.pretty {
            self.out.push('{');
            let mut i = 0;
            while let Some(entry) = entries.next_entry() {
                let (key, value) = entry?;
                if i > 0 {
                    self.out.push(',');
                }
                self.scalar(key)?;
                self.out.push_str(separator);
                self.value(value, "", false, depth + 1)?;
                i += 1;
            }
            self.out.push('}');
            return Ok(());
        }
        if !children_only {
            self.out.push_str(left);
        }
        self.out.push_str("{\n");
        let inner = format!("{left}{INDENT}");
        let mut i = 0;
        while let Some(entry) = entries.next_entry() {
            let (key, value) = entry?;
            self.out.push_str(&inner);
            self.scalar(key)?;
            self.out.push_str(separator);
            self.value(value, &inner, true, depth + 1)?;
            i += 1;
            if i < len {
                self.out.push(',');
            }
            self.out.push('\n');
        }
        self.out.push_str(left);
        self.out.push('}');
        Ok(())
    }

    fn scalar(&mut self, value: FlxValue<'_>) -> Result<(), FlexError> {
        match value.value_type() {
            ValueType::Null => self.out.push_str("null"),
            ValueType::Bool => {
                self.out
                    .push_str(if value.as_bool()? { "true" } else { "false" })
            }
            ValueType::Int | ValueType::IndirectInt => {
                let _ = write!(self.out, "{}", value.as_long()?);
            }
            ValueType::Uint | ValueType::IndirectUInt => {
                let _ = write!(self.out, "{}", value.as_ulong()?);
            }
            ValueType::Float | ValueType::IndirectFloat => self.float(value)?,
            ValueType::Key => {
                let key = value.as_str()?;
                let key = match self.style.truncate_key {
                    Some(prefix_len) => strip_chars(key, prefix_len),
                    None => key,
                };
                self.string(key);
            }
            ValueType::String => {
                let s = value.as_str()?;
                self.string(s);
            }
            ValueType::Blob => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(value.as_blob()?);
                self.out.push('"');
                self.out.push_str(&encoded);
                self.out.push('"');
            }
            other => return Err(other.mismatch("json scalar")),
        }
        Ok(())
    }

    /// 4-byte floats are widened first, so they print their exact value.
    fn float(&mut self, value: FlxValue<'_>) -> Result<(), FlexError> {
        let number = value.as_double()?;
        if number.is_finite() {
            let _ = write!(self.out, "{}", number);
        } else {
            self.out.push_str("null");
        }
        Ok(())
    }

    fn string(&mut self, s: &str) {
        self.out.push('"');
        if self.style.conform {
            for c in s.chars() {
                match c {
                    '"' => self.out.push_str("\\\""),
                    '\n' => self.out.push_str("\\n"),
                    '\r' => self.out.push_str("\\r"),
                    '\t' => self.out.push_str("\\t"),
                    '/' => self.out.push_str("\\/"),
                    c => self.out.push(c),
                }
            }
        } else {
            self.out.push_str(s);
        }
        self.out.push('"');
    }
}

/// Drops the first `count` characters; shorter keys become empty.
fn strip_chars(s: &str, count: usize) -> &str {
    s.char_indices().nth(count).map_or("", |(i, _)| &s[i..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_characters_not_bytes() {
        assert_eq!(strip_chars("01name", 2), "name");
        assert_eq!(strip_chars("é1x", 2), "x");
        assert_eq!(strip_chars("ab", 5), "");
        assert_eq!(strip_chars("ab", 0), "ab");
    }

    #[test]
    fn separators() {
        assert_eq!(JsonStyle::compact(true).separator(), ":");
        assert_eq!(JsonStyle::compact(true).truncate_keys(2).separator(), ":");
        assert_eq!(JsonStyle::pretty(true).separator(), " : ");
        assert_eq!(JsonStyle::pretty(true).truncate_keys(2).separator(), ": ");
    }
}
