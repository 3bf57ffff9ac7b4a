use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_RESUMES_COLLECTION: &str = "resumes";
pub const DEFAULT_JOBS_COLLECTION: &str = "jobs";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub collections: CollectionsConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cvmatch").join("config.toml"))
    }

    pub fn load() -> Result<Self, crate::error::ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<(), crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_embed_batch_size")]
    pub batch_size: u32,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_embed_batch_size() -> u32 {
    8
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            timeout_secs: default_timeout(),
            batch_size: default_embed_batch_size(),
        }
    }
}

/// Reference store settings. When `snapshot_path` is set, the in-process
/// backend persists a JSON snapshot there after every committed write.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

/// Logical collection names; the engine never hardcodes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsConfig {
    #[serde(default = "default_resumes_collection")]
    pub resumes: String,

    #[serde(default = "default_jobs_collection")]
    pub jobs: String,
}

fn default_resumes_collection() -> String {
    DEFAULT_RESUMES_COLLECTION.to_string()
}

fn default_jobs_collection() -> String {
    DEFAULT_JOBS_COLLECTION.to_string()
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            resumes: default_resumes_collection(),
            jobs: default_jobs_collection(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Records committed per store call
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Records with shorter text are skipped as a data-quality filter
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
}

fn default_chunk_size() -> usize {
    32
}

fn default_min_text_len() -> usize {
    20
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            min_text_len: default_min_text_len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default = "default_min_score")]
    pub default_min_score: f32,
}

fn default_limit() -> usize {
    10
}

fn default_min_score() -> f32 {
    0.5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_min_score: default_min_score(),
        }
    }
}
