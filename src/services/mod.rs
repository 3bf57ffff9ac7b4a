mod embedding;
mod ingest;
mod matcher;
mod stats;
pub(crate) mod vector_store;

pub use embedding::{Embedder, EmbeddingClient};
pub use ingest::{BatchIngestor, IngestReport};
pub use matcher::Matcher;
pub use stats::{CollectionStats, categories, collection_stats};
pub use vector_store::{MemoryBackend, Metric, QueryHit, VectorStore, create_backend};
