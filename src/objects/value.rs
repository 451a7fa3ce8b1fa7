//! Typed field values and the sentinel keyword tables that map them to the
//! external tool's text tokens.

use indexmap::IndexMap;

use crate::errors::{QconfError, Result};

/// One field value in an entity record.
///
/// Lists and sub-dictionaries keep their element order; the external text
/// format is order-sensitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Dict(IndexMap<String, Value>),
}

impl Value {
    pub fn str(value: impl Into<String>) -> Value {
        Value::Str(value.into())
    }

    pub fn list_of(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| Value::str(*s)).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Dict(d) => d.is_empty(),
            _ => false,
        }
    }

    /// Convert to the JSON representation. `+inf`/`-inf` have no JSON
    /// encoding, so they round-trip through the `INFINITY` keyword string.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) if f.is_infinite() => {
                if *f > 0.0 {
                    serde_json::Value::from("INFINITY")
                } else {
                    serde_json::Value::from("-INFINITY")
                }
            }
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Str(s) => serde_json::Value::from(s.as_str()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Dict(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Inverse of [`Value::to_json`].
    pub fn from_json(json: &serde_json::Value) -> Result<Value> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    return Err(QconfError::InvalidArgument(format!(
                        "unsupported json number: {}",
                        n
                    )));
                }
            }
            serde_json::Value::String(s) if s == "INFINITY" => Value::Float(f64::INFINITY),
            serde_json::Value::String(s) if s == "-INFINITY" => Value::Float(f64::NEG_INFINITY),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    list.push(Value::from_json(item)?);
                }
                Value::List(list)
            }
            serde_json::Value::Object(map) => {
                let mut dict = IndexMap::new();
                for (k, v) in map {
                    dict.insert(k.clone(), Value::from_json(v)?);
                }
                Value::Dict(dict)
            }
        })
    }

    /// Render a primitive value as plain text (no keyword substitution).
    pub fn to_plain_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::to_plain_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Dict(map) => map
                .iter()
                .map(|(k, v)| format!("{}={}", k, v.to_plain_text()))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Value::Float(f)
    }
}

/// Format a float the way qconf prints them: integral floats keep no
/// trailing garbage, everything else uses the shortest round-trip form.
pub fn format_float(f: f64) -> String {
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

/// Which sentinel keyword vocabulary a schema speaks.
///
/// Ordinary entities use `NONE`/`INFINITY`/`TRUE`/`FALSE`; complex-attribute
/// records use `NONE`/`YES`/`NO` (with `TRUE`/`FALSE` recognized for the
/// bool-typed default column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordTable {
    Standard,
    Complex,
}

impl KeywordTable {
    /// Pairs of (keyword, typed value), ordered; encoding walks the table
    /// and takes the first exact value match, decoding matches the keyword
    /// case-insensitively. Each table is bijective on its keyword subset.
    fn pairs(self) -> &'static [(&'static str, Value)] {
        const STANDARD: &[(&str, Value)] = &[
            ("NONE", Value::Null),
            ("INFINITY", Value::Float(f64::INFINITY)),
            ("TRUE", Value::Bool(true)),
            ("FALSE", Value::Bool(false)),
        ];
        const COMPLEX: &[(&str, Value)] = &[
            ("NONE", Value::Null),
            ("YES", Value::Bool(true)),
            ("NO", Value::Bool(false)),
        ];
        match self {
            KeywordTable::Standard => STANDARD,
            KeywordTable::Complex => COMPLEX,
        }
    }

    /// Decode a text token into its typed value, if it is a keyword.
    pub fn decode(self, text: &str) -> Option<Value> {
        let upper = text.to_uppercase();
        self.pairs()
            .iter()
            .find(|(keyword, _)| *keyword == upper)
            .map(|(_, value)| value.clone())
    }

    /// Encode a typed value as its keyword token, if it has one.
    pub fn encode(self, value: &Value) -> Option<&'static str> {
        self.pairs()
            .iter()
            .find(|(_, keyword_value)| keyword_value == value)
            .map(|(keyword, _)| *keyword)
    }
}

/// The bool-column vocabulary for complex attribute `default` fields.
pub fn decode_bool_keyword(text: &str) -> Option<bool> {
    match text.to_uppercase().as_str() {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

pub fn encode_bool_keyword(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}
