//! Ingestion record types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar property value carried by a record.
///
/// Timestamps are stored as RFC 3339 text and parsed by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Integer(i64),
    /// Integers above `i64::MAX`.
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    /// Convert a decoded JSON value into a scalar property.
    ///
    /// Returns `None` for arrays and objects.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Boolean(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Self::Unsigned(u))
                } else {
                    n.as_f64().map(Self::Float)
                }
            }
            Value::String(s) => Some(Self::Text(s)),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Borrow the text value, if this is a text property.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Unsigned(u) => write!(f, "{}", u),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Property name to scalar value.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Vector slot name to embedding.
pub type VectorMap = BTreeMap<String, Vec<f32>>;

/// A single object read from the archive, ready to be routed and loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionRecord {
    /// Object key in the store. Stable across runs.
    pub id: String,
    /// Scalar properties decoded from the object blob.
    pub properties: PropertyMap,
    /// Named vectors decoded from the `vector_<slot>` entries.
    pub vectors: VectorMap,
    /// Tenant assigned by the router, if multi-tenancy is enabled.
    pub tenant: Option<String>,
}

impl IngestionRecord {
    /// Create a record with no tenant.
    pub fn new(id: impl Into<String>, properties: PropertyMap, vectors: VectorMap) -> Self {
        Self {
            id: id.into(),
            properties,
            vectors,
            tenant: None,
        }
    }

    /// Tag the record with a tenant label.
    pub fn with_tenant(mut self, tenant: Option<String>) -> Self {
        self.tenant = tenant;
        self
    }

    /// Look up the embedding stored under `slot`.
    pub fn vector(&self, slot: &str) -> Option<&[f32]> {
        self.vectors.get(slot).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_from_json_scalars() {
        assert_eq!(
            PropertyValue::from_json(json!("Acme")),
            Some(PropertyValue::Text("Acme".to_string()))
        );
        assert_eq!(PropertyValue::from_json(json!(42)), Some(PropertyValue::Integer(42)));
        assert_eq!(PropertyValue::from_json(json!(1.5)), Some(PropertyValue::Float(1.5)));
        assert_eq!(PropertyValue::from_json(json!(null)), Some(PropertyValue::Null));
    }

    #[test]
    fn test_large_integers_keep_precision() {
        let big = u64::MAX - 1;
        let value = PropertyValue::from_json(json!(big)).unwrap();
        assert_eq!(value, PropertyValue::Unsigned(big));
        assert_eq!(value.to_string(), big.to_string());
        assert_eq!(serde_json::to_value(&value).unwrap(), json!(big));
    }

    #[test]
    fn test_property_from_json_rejects_nested() {
        assert!(PropertyValue::from_json(json!([1, 2])).is_none());
        assert!(PropertyValue::from_json(json!({"a": 1})).is_none());
    }

    #[test]
    fn test_property_serializes_untagged() {
        let mut props = PropertyMap::new();
        props.insert("company_author".to_string(), "Acme".into());
        props.insert("tweet_id".to_string(), 7i64.into());

        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(value, json!({"company_author": "Acme", "tweet_id": 7}));
    }

    #[test]
    fn test_record_vector_lookup() {
        let mut vectors = VectorMap::new();
        vectors.insert("text_with_metadata".to_string(), vec![0.1, 0.2]);
        let record = IngestionRecord::new("a", PropertyMap::new(), vectors)
            .with_tenant(Some("tenant_1".to_string()));

        assert_eq!(record.vector("text_with_metadata"), Some(&[0.1f32, 0.2][..]));
        assert!(record.vector("text").is_none());
        assert_eq!(record.tenant.as_deref(), Some("tenant_1"));
    }
}
