//! Knowledge record types.
//!
//! Metadata is a flat map of string keys to scalar values. Nulls are not
//! storable: callers pass [`RawMetadata`] and null entries are stripped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{LoreError, Result};

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// SQL value comparable with `json_extract` output. JSON booleans extract as 0/1.
    pub(crate) fn to_sql_value(&self) -> rusqlite::types::Value {
        use rusqlite::types::Value;
        match self {
            Self::Bool(b) => Value::Integer(i64::from(*b)),
            Self::Int(i) => Value::Integer(*i),
            Self::Float(f) => Value::Real(*f),
            Self::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Stored metadata. Ordered so serialized JSON is stable.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Caller-supplied metadata, which may carry nulls.
pub type RawMetadata = BTreeMap<String, Option<MetadataValue>>;

/// Drop null entries.
pub fn strip_nulls(raw: &RawMetadata) -> Metadata {
    raw.iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
        .collect()
}

/// Lift stored metadata back into the caller-facing form.
pub fn to_raw(metadata: &Metadata) -> RawMetadata {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), Some(v.clone())))
        .collect()
}

/// Convert a JSON object into metadata. Nulls are dropped; nested arrays or
/// objects are rejected.
pub fn metadata_from_json(value: &serde_json::Value) -> Result<Metadata> {
    let object = value
        .as_object()
        .ok_or_else(|| LoreError::validation("metadata must be a JSON object"))?;

    let mut metadata = Metadata::new();
    for (key, value) in object {
        let scalar = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::Bool(b) => MetadataValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => MetadataValue::Int(i),
                None => MetadataValue::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => MetadataValue::Text(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                return Err(LoreError::validation(format!(
                    "metadata value for '{key}' must be a scalar"
                )))
            }
        };
        metadata.insert(key.clone(), scalar);
    }
    Ok(metadata)
}

/// A stored chunk. The vector is kept in the index and not returned.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeChunk {
    /// UUID v7 assigned on insert.
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    pub created_at: String,
    pub updated_at: String,
}

/// A ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    /// Cosine distance to the query. Smaller is nearer.
    pub distance: f64,
}

impl SearchHit {
    /// `1 - distance`. A ranking score, not a probability.
    pub fn similarity(&self) -> f64 {
        1.0 - self.distance
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_documents: usize,
    pub embedding_model: String,
    pub llm_model: String,
}
