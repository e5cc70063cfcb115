//! # Element Configuration
//!
//! Immutable, copy-on-write configuration document.
//!
//! ## Design
//!
//! - Fields live behind an `Arc`, so cloning a config is a pointer copy
//! - Transformations (`with_field`, `without`, `with_type`) return a new
//!   document and leave the receiver untouched
//! - Field order is preserved exactly as written, which keeps the text
//!   serialization stable across form/text round trips
//! - The `type` field is always present and always a string

use crate::error::{kind_of, ConfigError, ConfigResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Name of the discriminator field
pub const TYPE_FIELD: &str = "type";

/// Configuration document for one element
#[derive(Clone, PartialEq)]
pub struct ElementConfig {
    fields: Arc<Map<String, Value>>,
}

impl ElementConfig {
    /// Create a minimal document holding only the discriminator
    pub fn new(element_type: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(TYPE_FIELD.to_string(), Value::String(element_type.into()));
        Self {
            fields: Arc::new(fields),
        }
    }

    /// Build a document from an arbitrary value, checking that it is a
    /// mapping with a string `type`
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(ConfigError::NotAnObject(kind_of(&other))),
        }
    }

    /// Build a document from a mapping
    pub fn from_map(fields: Map<String, Value>) -> ConfigResult<Self> {
        check_type(fields.get(TYPE_FIELD))?;
        Ok(Self {
            fields: Arc::new(fields),
        })
    }

    /// The type discriminator
    pub fn element_type(&self) -> &str {
        self.fields
            .get(TYPE_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All fields, in document order
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Field names, in document order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Return a copy with `key` set to `value`, or removed when `value` is
    /// `None`. Existing keys keep their position.
    pub fn with_field(&self, key: &str, value: Option<Value>) -> ConfigResult<Self> {
        if key == TYPE_FIELD {
            check_type(value.as_ref())?;
        }

        let mut fields = Arc::clone(&self.fields);
        let map = Arc::make_mut(&mut fields);
        match value {
            Some(value) => {
                map.insert(key.to_string(), value);
            }
            None => {
                map.shift_remove(key);
            }
        }

        Ok(Self { fields })
    }

    /// Return a copy without `key`. Removing `type` is refused.
    pub fn without(&self, key: &str) -> ConfigResult<Self> {
        self.with_field(key, None)
    }

    /// Return a copy with a different discriminator
    pub fn with_type(&self, element_type: impl Into<String>) -> Self {
        let mut fields = Arc::clone(&self.fields);
        Arc::make_mut(&mut fields).insert(
            TYPE_FIELD.to_string(),
            Value::String(element_type.into()),
        );
        Self { fields }
    }

    /// Convert into a plain JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.as_ref().clone())
    }

    /// Whether two handles share the same underlying document
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.fields, &b.fields)
    }
}

fn check_type(value: Option<&Value>) -> ConfigResult<()> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(()),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(ConfigError::MissingType),
        Some(other) => Err(ConfigError::InvalidType(kind_of(other))),
    }
}

impl fmt::Debug for ElementConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementConfig({})", Value::Object(self.fields.as_ref().clone()))
    }
}

impl Serialize for ElementConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ElementConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ElementConfig::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Value> for ElementConfig {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        ElementConfig::from_value(value)
    }
}
