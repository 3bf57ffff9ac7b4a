use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Metric, QueryHit, VectorStore};
use crate::error::StoreError;
use crate::models::{Document, MetadataFilter};

/// One named collection. Documents keep insertion order so repeated queries
/// over equal distances stay deterministic; upserts replace in place.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    metric: Metric,
    /// Fixed by the first successful insert.
    dimension: Option<usize>,
    documents: Vec<Document>,
}

impl Collection {
    fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.id == id)
    }
}

/// In-process reference store: brute-force scan over insertion-ordered
/// documents, with an optional JSON snapshot for durability across restarts.
///
/// The snapshot is rewritten after every successful `add`, so each committed
/// chunk of an ingestion run is independently durable.
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, Collection>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryBackend {
    /// Open the backend, loading the snapshot at `snapshot_path` if present.
    pub fn open(snapshot_path: Option<PathBuf>) -> Result<Self, StoreError> {
        let collections = match &snapshot_path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| StoreError::Persist(e.to_string()))?;
                serde_json::from_str(&content).map_err(|e| StoreError::Persist(e.to_string()))?
            }
            _ => HashMap::new(),
        };

        Ok(Self {
            collections: RwLock::new(collections),
            snapshot_path,
        })
    }

    /// Volatile backend without a snapshot.
    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            snapshot_path: None,
        }
    }

    fn persist(&self, collections: &HashMap<String, Collection>) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Persist(e.to_string()))?;
        }

        let content = serde_json::to_string(collections)
            .map_err(|e| StoreError::Persist(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| StoreError::Persist(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for MemoryBackend {
    async fn get_or_create_collection(
        &self,
        name: &str,
        metric: Metric,
    ) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if let Some(existing) = collections.get(name) {
            if existing.metric != metric {
                return Err(StoreError::MetricConflict {
                    collection: name.to_string(),
                    existing: existing.metric,
                    requested: metric,
                });
            }
            return Ok(());
        }

        debug!(collection = name, %metric, "creating collection");
        collections.insert(
            name.to_string(),
            Collection {
                metric,
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn add(&self, collection: &str, documents: Vec<Document>) -> Result<(), StoreError> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let col = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        // Validate every vector before touching the collection, so a
        // mismatch anywhere fails the whole call with no partial insert.
        let expected = col.dimension.unwrap_or(documents[0].dimension());
        for doc in &documents {
            if doc.dimension() != expected {
                return Err(StoreError::DimensionMismatch {
                    collection: collection.to_string(),
                    expected,
                    actual: doc.dimension(),
                });
            }
        }
        col.dimension.get_or_insert(expected);

        let count = documents.len();
        for doc in documents {
            match col.position(&doc.id) {
                Some(pos) => col.documents[pos] = doc,
                None => col.documents.push(doc),
            }
        }

        debug!(collection, count, total = col.documents.len(), "committed documents");
        self.persist(&collections)
    }

    async fn query(
        &self,
        collection: &str,
        query_vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryHit>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let col = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        if let Some(expected) = col.dimension
            && query_vector.len() != expected
        {
            return Err(StoreError::DimensionMismatch {
                collection: collection.to_string(),
                expected,
                actual: query_vector.len(),
            });
        }

        let mut hits: Vec<QueryHit> = col
            .documents
            .iter()
            .filter(|doc| filter.is_none_or(|f| f.matches(&doc.metadata)))
            .map(|doc| QueryHit {
                id: doc.id.clone(),
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
                distance: col.metric.distance(query_vector, &doc.vector),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        collections
            .get(collection)
            .map(|col| col.documents.len())
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        collections
            .get(collection)
            .map(|col| col.documents.clone())
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        self.persist(&collections)
    }
}
