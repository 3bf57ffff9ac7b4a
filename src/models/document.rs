use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Str(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Str(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Int(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

/// Typed metadata attached to a document.
///
/// Keys the engine never reads pass through opaquely. Reads of absent keys
/// yield a default rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetaValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning self for chained construction.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    /// Read a string field, falling back to `default` when the key is absent
    /// or holds a non-string value.
    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.0.get(key).and_then(MetaValue::as_str).unwrap_or(default)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetaValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Immutable unit of retrievable content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique within a collection, stable across re-ingestion runs.
    pub id: String,
    /// Embedding vector; all documents in a collection share one length.
    pub vector: Vec<f32>,
    /// Canonical content the vector was derived from.
    pub text: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        vector: Vec<f32>,
        text: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            vector,
            text: text.into(),
            metadata,
        }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A raw tabular record that can be turned into a [`Document`].
///
/// `doc_id` must derive from a stable source key (never from ingestion
/// order), so re-running ingestion upserts instead of duplicating.
pub trait SourceRecord {
    fn doc_id(&self) -> String;

    /// Mandatory text field; records below the configured minimum length are
    /// skipped by the ingestor.
    fn text(&self) -> &str;

    fn metadata(&self) -> Metadata;
}
