//! Read-only diagnostics over a collection's metadata.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::vector_store::VectorStore;
use crate::error::StoreError;
use crate::models::MetaValue;

/// Documents with no `category` metadata count under this key.
const UNKNOWN_CATEGORY: &str = "unknown";

/// Aggregate view of one collection. Serialized output keeps histogram keys
/// in lexicographic order.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub total_count: usize,
    /// None while the collection is empty.
    pub dimension: Option<usize>,
    pub category_histogram: BTreeMap<String, u64>,
}

/// Compute stats with a single full read. Operator/diagnostic path only;
/// cost is bounded by collection size.
pub async fn collection_stats(
    store: &dyn VectorStore,
    collection: &str,
) -> Result<CollectionStats, StoreError> {
    let documents = store.get_all(collection).await?;

    let dimension = documents.first().map(|d| d.dimension());
    let mut category_histogram: BTreeMap<String, u64> = BTreeMap::new();
    for doc in &documents {
        let category = doc.metadata.get_str_or("category", UNKNOWN_CATEGORY);
        *category_histogram.entry(category.to_string()).or_insert(0) += 1;
    }

    Ok(CollectionStats {
        total_count: documents.len(),
        dimension,
        category_histogram,
    })
}

/// Distinct categories present in the collection, sorted. Documents without
/// a category are not represented here.
pub async fn categories(
    store: &dyn VectorStore,
    collection: &str,
) -> Result<Vec<String>, StoreError> {
    let documents = store.get_all(collection).await?;

    let set: BTreeSet<String> = documents
        .iter()
        .filter_map(|doc| doc.metadata.get("category"))
        .filter_map(MetaValue::as_str)
        .map(str::to_string)
        .collect();

    Ok(set.into_iter().collect())
}
