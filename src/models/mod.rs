mod config;
mod document;
mod search;

pub use config::{
    CollectionsConfig, Config, DEFAULT_EMBEDDING_URL, DEFAULT_JOBS_COLLECTION,
    DEFAULT_RESUMES_COLLECTION, EmbeddingConfig, IngestConfig, SearchConfig, StoreConfig,
};
pub use document::{Document, MetaValue, Metadata, SourceRecord};
pub use search::{MatchRequest, MetadataFilter, SearchResult};
