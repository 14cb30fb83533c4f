//! Span attributes.
//!
//! Typed attribute values with a canonical string form, and an
//! insertion-ordered attribute map with unique keys.

use base64::{engine::general_purpose, Engine as _};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A typed attribute value.
///
/// Serialized in OTLP JSON form: a single-entry object keyed by the variant
/// (`stringValue`, `intValue`, ...), or `{}` for an empty value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
    Double(f64),
    Bytes(Vec<u8>),
    Array(Vec<AttributeValue>),
    Map(Vec<KeyValue>),
    #[default]
    Empty,
}

impl AttributeValue {
    /// Canonical string form used for pattern matching and length checks.
    ///
    /// Never fails: every shape has a string form.
    pub fn canonical_string(&self) -> String {
        match self {
            AttributeValue::String(s) => s.clone(),
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Int(i) => i.to_string(),
            AttributeValue::Double(d) => d.to_string(),
            AttributeValue::Bytes(bytes) => general_purpose::STANDARD.encode(bytes),
            AttributeValue::Array(_) | AttributeValue::Map(_) => self.to_json().to_string(),
            AttributeValue::Empty => String::new(),
        }
    }

    /// Plain JSON rendering of the value.
    pub fn to_json(&self) -> Value {
        match self {
            AttributeValue::String(s) => Value::String(s.clone()),
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Int(i) => Value::from(*i),
            // Non-finite doubles have no JSON number form.
            AttributeValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(d.to_string())),
            AttributeValue::Bytes(bytes) => Value::String(general_purpose::STANDARD.encode(bytes)),
            AttributeValue::Array(items) => {
                Value::Array(items.iter().map(AttributeValue::to_json).collect())
            }
            AttributeValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|kv| (kv.key.clone(), kv.value.to_json()))
                    .collect(),
            ),
            AttributeValue::Empty => Value::Null,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a value from JSON without failing.
    ///
    /// Accepts the OTLP forms, including string-encoded `intValue` and
    /// `doubleValue` and `{"values": [...]}` wrappers, as well as plain JSON.
    /// Anything unrecognised is kept as its compact JSON text.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => AttributeValue::Empty,
            Value::Bool(b) => AttributeValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Int(i),
                None => n
                    .as_f64()
                    .map(AttributeValue::Double)
                    .unwrap_or_else(|| AttributeValue::String(n.to_string())),
            },
            Value::String(s) => AttributeValue::String(s),
            Value::Array(items) => {
                AttributeValue::Array(items.into_iter().map(AttributeValue::from_json).collect())
            }
            Value::Object(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (None, _) => AttributeValue::Empty,
                    (Some((tag, inner)), None) => Self::from_tagged(&tag, inner),
                    (Some(first), Some(second)) => {
                        let object: Map<String, Value> =
                            [first, second].into_iter().chain(entries).collect();
                        AttributeValue::String(Value::Object(object).to_string())
                    }
                }
            }
        }
    }

    fn from_tagged(tag: &str, inner: Value) -> Self {
        match (tag, inner) {
            ("stringValue", Value::String(s)) => AttributeValue::String(s),
            ("boolValue", Value::Bool(b)) => AttributeValue::Bool(b),
            ("boolValue", Value::String(s)) if s == "true" || s == "false" => {
                AttributeValue::Bool(s == "true")
            }
            ("intValue", Value::Number(n)) if n.is_i64() => {
                n.as_i64().map(AttributeValue::Int).unwrap_or_default()
            }
            ("intValue", Value::String(s)) if s.trim().parse::<i64>().is_ok() => {
                s.trim().parse().map(AttributeValue::Int).unwrap_or_default()
            }
            ("doubleValue", Value::Number(n)) if n.as_f64().is_some() => {
                n.as_f64().map(AttributeValue::Double).unwrap_or_default()
            }
            ("doubleValue", Value::String(s)) if s.trim().parse::<f64>().is_ok() => {
                s.trim().parse().map(AttributeValue::Double).unwrap_or_default()
            }
            ("bytesValue", Value::String(s)) => {
                match general_purpose::STANDARD.decode(s.as_bytes()) {
                    Ok(bytes) => AttributeValue::Bytes(bytes),
                    Err(_) => AttributeValue::String(s),
                }
            }
            ("arrayValue", inner) => match unwrap_values(inner) {
                Ok(items) => {
                    AttributeValue::Array(items.into_iter().map(AttributeValue::from_json).collect())
                }
                Err(inner) => Self::fallback(inner),
            },
            ("kvlistValue", inner) => match unwrap_values(inner) {
                Ok(items) => {
                    AttributeValue::Map(items.into_iter().filter_map(key_value_from_json).collect())
                }
                Err(inner) => Self::fallback(inner),
            },
            ("stringValue" | "boolValue" | "intValue" | "doubleValue" | "bytesValue", inner) => {
                Self::fallback(inner)
            }
            (_, inner) => {
                let mut object = Map::new();
                object.insert(tag.to_string(), inner);
                AttributeValue::String(Value::Object(object).to_string())
            }
        }
    }

    /// Payload of a known tag with the wrong shape.
    fn fallback(inner: Value) -> Self {
        match inner {
            Value::Null => AttributeValue::Empty,
            Value::String(s) => AttributeValue::String(s),
            other => AttributeValue::String(other.to_string()),
        }
    }
}

/// Items of an OTLP list, given either bare or as `{"values": [...]}`.
fn unwrap_values(inner: Value) -> Result<Vec<Value>, Value> {
    match inner {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) if map.len() == 1 && map.contains_key("values") => {
            match map.remove("values") {
                Some(Value::Array(items)) => Ok(items),
                Some(other) => Err(other),
                None => Ok(Vec::new()),
            }
        }
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        other => Err(other),
    }
}

/// A kvlist entry; entries without a string key are dropped.
fn key_value_from_json(entry: Value) -> Option<KeyValue> {
    match entry {
        Value::Object(mut map) => {
            let key = match map.remove("key") {
                Some(Value::String(key)) => key,
                _ => return None,
            };
            let value = map.remove("value").map(AttributeValue::from_json).unwrap_or_default();
            Some(KeyValue { key, value })
        }
        _ => None,
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = usize::from(!matches!(self, AttributeValue::Empty));
        let mut map = serializer.serialize_map(Some(len))?;
        match self {
            AttributeValue::String(s) => map.serialize_entry("stringValue", s)?,
            AttributeValue::Bool(b) => map.serialize_entry("boolValue", b)?,
            AttributeValue::Int(i) => map.serialize_entry("intValue", i)?,
            AttributeValue::Double(d) => map.serialize_entry("doubleValue", d)?,
            AttributeValue::Bytes(bytes) => {
                map.serialize_entry("bytesValue", &general_purpose::STANDARD.encode(bytes))?
            }
            AttributeValue::Array(items) => map.serialize_entry("arrayValue", items)?,
            AttributeValue::Map(entries) => map.serialize_entry("kvlistValue", entries)?,
            AttributeValue::Empty => {}
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(AttributeValue::from_json)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(value)
    }
}

/// One attribute: a key and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(default)]
    pub value: AttributeValue,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Insertion-ordered attribute map with unique keys.
///
/// Serialized as a list of `{"key", "value"}` entries. On decode a repeated
/// key keeps its first position and its last value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<KeyValue>", into = "Vec<KeyValue>")]
pub struct Attributes {
    entries: Vec<KeyValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries.iter().find(|kv| kv.key == key).map(|kv| &kv.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|kv| kv.key == key)
    }

    /// Insert or replace. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|kv| kv.key == key) {
            Some(existing) => existing.value = value,
            None => self.entries.push(KeyValue { key, value }),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        let index = self.entries.iter().position(|kv| kv.key == key)?;
        Some(self.entries.remove(index).value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|kv| (kv.key.as_str(), &kv.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|kv| kv.key.as_str())
    }
}

impl From<Vec<KeyValue>> for Attributes {
    fn from(entries: Vec<KeyValue>) -> Self {
        entries.into_iter().map(|kv| (kv.key, kv.value)).collect()
    }
}

impl From<Attributes> for Vec<KeyValue> {
    fn from(attributes: Attributes) -> Self {
        attributes.entries
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}
