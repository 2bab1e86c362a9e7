//! The JSON-like value model shared by the translator, the pipeline and the
//! remote backends.
//!
//! [`Value`] mirrors `serde_json::Value` with one extra variant,
//! [`Value::Date`], so that calendar dates supplied by the application survive
//! until the translator lowers them to the `YYYY-MM-DD` strings the remote
//! store expects.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::Number;
use uuid::Uuid;

use crate::{Error, Result};

/// Format used for calendar dates on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// String-keyed mapping, ordered by key for stable output.
pub type Map = BTreeMap<String, Value>;

// ─── Value ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Number(Number),
  String(String),
  /// A calendar date. Only the application side produces this variant; the
  /// remote store carries dates as strings.
  Date(NaiveDate),
  Array(Vec<Value>),
  Object(Map),
}

impl Value {
  /// Short name of the variant, used in error messages.
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "bool",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Date(_) => "date",
      Value::Array(_) => "array",
      Value::Object(_) => "object",
    }
  }

  pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_object(&self) -> Option<&Map> {
    match self {
      Value::Object(map) => Some(map),
      _ => None,
    }
  }

  pub fn as_object_mut(&mut self) -> Option<&mut Map> {
    match self {
      Value::Object(map) => Some(map),
      _ => None,
    }
  }

  /// Look up `key` if this value is an object.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.as_object().and_then(|map| map.get(key))
  }

  /// Convert to a `serde_json::Value`. Dates become `YYYY-MM-DD` strings.
  pub fn to_json(&self) -> serde_json::Value {
    match self {
      Value::Null => serde_json::Value::Null,
      Value::Bool(b) => serde_json::Value::Bool(*b),
      Value::Number(n) => serde_json::Value::Number(n.clone()),
      Value::String(s) => serde_json::Value::String(s.clone()),
      Value::Date(d) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
      Value::Array(items) => {
        serde_json::Value::Array(items.iter().map(Value::to_json).collect())
      }
      Value::Object(map) => serde_json::Value::Object(
        map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
      ),
    }
  }

  /// Serialise any `T` into a [`Value`] via its serde representation.
  pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
    Ok(serde_json::to_value(value)?.into())
  }

  /// Deserialise a `T` out of this value.
  pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
    Ok(serde_json::from_value(self.to_json())?)
  }
}

impl From<serde_json::Value> for Value {
  fn from(v: serde_json::Value) -> Self {
    match v {
      serde_json::Value::Null => Value::Null,
      serde_json::Value::Bool(b) => Value::Bool(b),
      serde_json::Value::Number(n) => Value::Number(n),
      serde_json::Value::String(s) => Value::String(s),
      serde_json::Value::Array(items) => {
        Value::Array(items.into_iter().map(Value::from).collect())
      }
      serde_json::Value::Object(map) => {
        Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
      }
    }
  }
}

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.to_json().serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for Value {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Value::from)
  }
}

// ─── Conversions into Value ──────────────────────────────────────────────────

impl From<&str> for Value {
  fn from(s: &str) -> Self { Value::String(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Value::String(s) }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self { Value::Number(n.into()) }
}

impl From<i32> for Value {
  fn from(n: i32) -> Self { Value::Number(n.into()) }
}

impl From<u32> for Value {
  fn from(n: u32) -> Self { Value::Number(n.into()) }
}

impl From<f64> for Value {
  /// Non-finite floats have no JSON representation and become `Null`.
  fn from(n: f64) -> Self {
    Number::from_f64(n).map_or(Value::Null, Value::Number)
  }
}

impl From<NaiveDate> for Value {
  fn from(d: NaiveDate) -> Self { Value::Date(d) }
}

impl From<DateTime<Utc>> for Value {
  fn from(dt: DateTime<Utc>) -> Self { Value::String(dt.to_rfc3339()) }
}

impl From<Uuid> for Value {
  fn from(id: Uuid) -> Self { Value::String(id.hyphenated().to_string()) }
}

impl From<Map> for Value {
  fn from(map: Map) -> Self { Value::Object(map) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Value::Null, Into::into) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
  fn from(items: Vec<T>) -> Self {
    Value::Array(items.into_iter().map(Into::into).collect())
  }
}

// ─── Payload ─────────────────────────────────────────────────────────────────

/// An internal-shape (camelCase) object handed to the mutation pipeline.
///
/// Creation payloads carry every field the caller wants stored; update
/// payloads carry only the fields being patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map);

impl Payload {
  pub fn new() -> Self { Self::default() }

  /// Builder-style insert.
  pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.0.insert(key.into(), value.into());
    self
  }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
    self.0.insert(key.into(), value.into());
  }

  pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

  /// Fetch `key` as a string slice, treating non-strings as absent.
  pub fn str_field(&self, key: &str) -> Option<&str> {
    self.0.get(key).and_then(Value::as_str)
  }

  pub fn contains(&self, key: &str) -> bool { self.0.contains_key(key) }

  pub fn remove(&mut self, key: &str) -> Option<Value> { self.0.remove(key) }

  pub fn as_map(&self) -> &Map { &self.0 }

  pub fn into_value(self) -> Value { Value::Object(self.0) }

  /// Build a payload from any serialisable struct. Fails unless it serialises
  /// to an object.
  pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
    match Value::from_serialize(value)? {
      Value::Object(map) => Ok(Self(map)),
      other => Err(Error::NotAnObject(other.type_name())),
    }
  }
}

impl From<Map> for Payload {
  fn from(map: Map) -> Self { Self(map) }
}

impl TryFrom<Value> for Payload {
  type Error = Error;

  fn try_from(value: Value) -> Result<Self> {
    match value {
      Value::Object(map) => Ok(Self(map)),
      other => Err(Error::NotAnObject(other.type_name())),
    }
  }
}
