//! Query parameters and result types for the matching path.

use serde::{Deserialize, Serialize};

use super::config::SearchConfig;
use super::document::{MetaValue, Metadata};

/// Conjunction of equality constraints over metadata fields.
///
/// A document matches only if every `(field, value)` pair is present and
/// equal. Applied at the store before the k-limit, so a query for k results
/// returns the k nearest *matching* documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter(Vec<(String, MetaValue)>);

impl MetadataFilter {
    /// Single-field equality filter.
    pub fn equals(field: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        Self(vec![(field.into(), value.into())])
    }

    /// Add another equality constraint (AND logic).
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.0.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.0
            .iter()
            .all(|(field, value)| metadata.get(field) == Some(value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parameters shared by both matching call shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    /// Maximum results to return
    pub n_results: usize,

    /// Minimum similarity score (0.0-1.0)
    pub min_score: f32,

    /// Metadata filter pushed down to the store
    pub filter: Option<MetadataFilter>,
}

impl Default for MatchRequest {
    fn default() -> Self {
        Self {
            n_results: 10,
            min_score: 0.5,
            filter: None,
        }
    }
}

impl MatchRequest {
    pub fn new(n_results: usize) -> Self {
        Self {
            n_results,
            ..Default::default()
        }
    }

    /// Request using the configured search defaults.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            n_results: config.default_limit,
            min_score: config.default_min_score,
            filter: None,
        }
    }

    /// Set the minimum similarity threshold.
    #[must_use]
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Set the metadata filter.
    #[must_use]
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// A single match, derived from a store query and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matched document ID
    pub id: String,

    /// Matched document content
    pub text: String,

    /// Metadata copied from the matched document
    pub metadata: Metadata,

    /// Raw metric distance reported by the store (lower = more similar)
    pub distance: f32,

    /// `1 - distance`. Conventionally in [0, 1] for cosine distance but not
    /// clamped; degenerate non-unit vectors can fall outside that range.
    pub similarity_score: f32,
}
