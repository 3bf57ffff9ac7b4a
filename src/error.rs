//! Error types for the matching engine.

use thiserror::Error;

use crate::services::vector_store::Metric;
use crate::utils::retry::Retryable;

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection and timeout errors are retryable
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            // Server errors might be transient (e.g., 503 Service Unavailable)
            EmbeddingError::ServerError(msg) => {
                msg.contains("503")
                    || msg.contains("502")
                    || msg.contains("504")
                    || msg.contains("429")
                    || msg.to_lowercase().contains("unavailable")
                    || msg.to_lowercase().contains("too many requests")
            }
            // Request errors depend on the underlying cause
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            // Invalid responses are not retryable
            EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("collection {collection} uses metric {existing}, requested {requested}")]
    MetricConflict {
        collection: String,
        existing: Metric,
        requested: Metric,
    },

    #[error("vector dimension mismatch in {collection}: expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("snapshot persistence error: {0}")]
    Persist(String),
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        match self {
            // Availability problems might clear up
            StoreError::Unavailable(_) => true,
            // Contract violations never do
            StoreError::CollectionNotFound(_)
            | StoreError::MetricConflict { .. }
            | StoreError::DimensionMismatch { .. }
            | StoreError::Persist(_) => false,
        }
    }
}

/// Errors surfaced by the query path.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] StoreError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Errors that abort an entire ingestion run before any chunk is processed.
///
/// Per-chunk embed/commit failures do not use this type; they are isolated
/// and aggregated into the [`IngestReport`](crate::services::IngestReport).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("vector store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors related to reading tabular record sources.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("match error: {0}")]
    Match(#[from] MatchError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_retryability() {
        assert!(StoreError::Unavailable("connection reset".to_string()).is_retryable());
        assert!(
            !StoreError::DimensionMismatch {
                collection: "jobs".to_string(),
                expected: 384,
                actual: 512,
            }
            .is_retryable()
        );
        assert!(!StoreError::CollectionNotFound("resumes".to_string()).is_retryable());
    }

    #[test]
    fn test_embedding_error_retryability() {
        assert!(EmbeddingError::Timeout.is_retryable());
        assert!(EmbeddingError::ServerError("status 503".to_string()).is_retryable());
        assert!(!EmbeddingError::InvalidResponse("bad json".to_string()).is_retryable());
    }

    #[test]
    fn test_match_error_from_store() {
        let err: MatchError = StoreError::CollectionNotFound("jobs".to_string()).into();
        assert!(matches!(
            err,
            MatchError::Retrieval(StoreError::CollectionNotFound(_))
        ));
    }
}
