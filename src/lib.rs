pub mod error;
pub mod models;
pub mod services;
pub mod sources;
pub mod utils;

pub use error::AppError;
pub use models::{Config, Document, MatchRequest, Metadata, SearchResult};
pub use services::{BatchIngestor, IngestReport, Matcher};
