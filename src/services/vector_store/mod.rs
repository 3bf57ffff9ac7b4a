//! Vector store abstraction layer.
//!
//! A trait-based abstraction over the durable collection store, with an
//! in-process reference backend. Collections are independent namespaces with
//! a fixed similarity metric and a fixed vector dimensionality established by
//! the first successful insert.

mod memory;

pub use memory::MemoryBackend;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::{Document, Metadata, MetadataFilter, StoreConfig};

/// Similarity metric fixed per collection at creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
}

impl Metric {
    /// Raw distance between two vectors of equal length (lower = closer).
    ///
    /// Cosine distance of a zero-norm vector is defined as 1.0, the distance
    /// of orthogonal vectors.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Cosine => {
                let mut dot = 0.0f32;
                let mut norm_a = 0.0f32;
                let mut norm_b = 0.0f32;
                for (x, y) in a.iter().zip(b.iter()) {
                    dot += x * y;
                    norm_a += x * x;
                    norm_b += y * y;
                }
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 1.0;
                }
                1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
            }
            Metric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Cosine => write!(f, "cosine"),
            Metric::Euclidean => write!(f, "euclidean"),
        }
    }
}

/// A raw store query row, ordered ascending by distance.
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    pub distance: f32,
}

/// Abstract trait for vector store operations.
///
/// Reads are safe for concurrent callers; writers to one collection must be
/// serialized by the caller.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it doesn't exist. Idempotent; an existing
    /// collection with a different metric fails with
    /// [`StoreError::MetricConflict`].
    async fn get_or_create_collection(&self, name: &str, metric: Metric)
    -> Result<(), StoreError>;

    /// Upsert documents. The whole call fails on any dimensionality mismatch,
    /// leaving the collection unchanged; re-adding an existing id overwrites.
    async fn add(&self, collection: &str, documents: Vec<Document>) -> Result<(), StoreError>;

    /// Nearest-neighbor query, ascending by distance, at most `k` rows.
    ///
    /// The filter is applied before the k-limit (filter-then-rank), so `k`
    /// bounds the *matching* nearest documents.
    async fn query(
        &self,
        collection: &str,
        query_vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryHit>, StoreError>;

    /// Number of documents in the collection.
    async fn count(&self, collection: &str) -> Result<usize, StoreError>;

    /// Full document list. Diagnostic reads only, not the hot query path.
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Persist any buffered state. Called once at shutdown.
    async fn flush(&self) -> Result<(), StoreError>;
}

/// Create the reference store backend from configuration.
pub fn create_backend(config: &StoreConfig) -> Result<Arc<dyn VectorStore>, StoreError> {
    let backend = MemoryBackend::open(config.snapshot_path.clone())?;
    Ok(Arc::new(backend))
}
