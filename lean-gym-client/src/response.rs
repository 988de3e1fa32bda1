//! Decoding of lean-gym response lines.
//!
//! lean-gym prints one response per command as a line starting with `{`.
//! Everything else in the session log (startup banners, echoed input) is
//! noise. A response line carries `"key":value` pairs where value is one of
//!
//! ```text
//! value  := "null" | list | string
//! list   := "[" ( string | any char except "[" "]" )* "]"
//! string := '"' any char except '"' * '"'
//! key    := ( "_" | alphanumeric )+
//! ```
//!
//! Pairs are picked out wherever they occur in the line, so a line that is not
//! well-formed JSON still yields whatever pairs it contains. Quoted strings made
//! only of ASCII digits decode as integers, which is how lean-gym transmits ids.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::command::unescape_newlines;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// `null`
    Null,
    /// A quoted string of decimal digits. Values too large for `u64`
    /// decode as `Text` instead.
    Int(u64),
    /// Any other quoted string, with `\n` restored to newlines.
    Text(String),
    /// A bracketed list of quoted strings, kept verbatim.
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// One decoded response line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseRecord {
    fields: HashMap<String, FieldValue>,
}

impl ResponseRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field by name.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Get an integer field.
    pub fn int(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(FieldValue::as_int)
    }

    /// Get a text field.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    /// Get a list field.
    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(FieldValue::as_list)
    }

    /// Whether the field is present and `null`.
    pub fn is_null(&self, key: &str) -> bool {
        self.get(key).is_some_and(FieldValue::is_null)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over all fields in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    /// Search id of the search this response belongs to.
    pub fn search_id(&self) -> Option<u64> {
        self.int("search_id")
    }

    /// Id of the tactic state produced by the command.
    pub fn tactic_state_id(&self) -> Option<u64> {
        self.int("tactic_state_id")
    }

    /// Pretty-printed tactic state.
    pub fn tactic_state(&self) -> Option<&str> {
        self.text("tactic_state")
    }

    /// Error reported by the REPL, if any.
    pub fn error(&self) -> Option<&str> {
        self.text("error")
    }

    /// Tactics applied so far in this search.
    pub fn proof_steps(&self) -> Option<&[String]> {
        self.list("proof_steps")
    }
}

impl From<HashMap<String, FieldValue>> for ResponseRecord {
    fn from(fields: HashMap<String, FieldValue>) -> Self {
        Self { fields }
    }
}

impl IntoIterator for ResponseRecord {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::hash_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Whether a log line is a response line.
pub fn is_candidate(line: &str) -> bool {
    line.starts_with('{')
}

/// Decode a log line.
///
/// Returns None for noise lines. A response line always decodes, possibly to
/// an empty record when no pair in it matches the grammar.
pub fn decode_line(line: &str) -> Option<ResponseRecord> {
    is_candidate(line).then(|| parse_record(line))
}

/// Extract every `"key":value` pair from `src`. Later keys win.
pub fn parse_record(src: &str) -> ResponseRecord {
    let mut record = ResponseRecord::new();
    let mut pos = 0;

    while let Some(offset) = src[pos..].find('"') {
        let start = pos + offset;
        match parse_field(src, start) {
            Some((key, value, end)) => {
                record.insert(key, value);
                pos = end;
            }
            None => pos = start + 1,
        }
    }

    record
}

/// Parse one pair whose opening key quote is at `start`.
/// Returns the key, the value and the byte offset just past the value.
fn parse_field(src: &str, start: usize) -> Option<(&str, FieldValue, usize)> {
    let key_start = start + 1;
    let key_len = src[key_start..]
        .char_indices()
        .find(|(_, c)| !is_key_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(src.len() - key_start);
    if key_len == 0 {
        return None;
    }
    let key_end = key_start + key_len;

    let rest = src[key_end..].strip_prefix("\":")?;
    let value_start = src.len() - rest.len();
    let (value, value_len) = parse_value(rest)?;
    Some((&src[key_start..key_end], value, value_start + value_len))
}

fn is_key_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Parse a value at the start of `src`, returning it with its byte length.
fn parse_value(src: &str) -> Option<(FieldValue, usize)> {
    if src.starts_with("null") {
        return Some((FieldValue::Null, 4));
    }

    if let Some(body) = src.strip_prefix('[') {
        let close = body.find(['[', ']'])?;
        if !body[close..].starts_with(']') {
            return None;
        }
        return Some((FieldValue::List(quoted_strings(&body[..close])), close + 2));
    }

    if let Some(body) = src.strip_prefix('"') {
        let close = body.find('"')?;
        return Some((decode_string(&body[..close]), close + 2));
    }

    None
}

fn decode_string(raw: &str) -> FieldValue {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = raw.parse() {
            return FieldValue::Int(n);
        }
    }
    FieldValue::Text(unescape_newlines(raw))
}

/// Contents of every complete `"..."` in `src`, in order.
fn quoted_strings(src: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut rest = src;
    while let Some(open) = rest.find('"') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('"') else {
            break;
        };
        items.push(after[..close].to_string());
        rest = &after[close + 1..];
    }
    items
}
