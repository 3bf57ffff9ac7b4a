//! Batch ingestion: stream records, embed in fixed-size chunks, commit each
//! chunk independently.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

use super::embedding::Embedder;
use super::vector_store::{Metric, VectorStore};
use crate::error::IngestError;
use crate::models::{Document, IngestConfig, Metadata, SourceRecord};

/// Aggregated outcome of one ingestion run.
///
/// `attempted == committed + skipped + failed` always holds: skips are the
/// data-quality filter, failures are store/embedding errors isolated at chunk
/// granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub attempted: usize,
    pub committed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.attempted == self.committed + self.skipped + self.failed
    }
}

/// A validated record waiting for its chunk to fill.
struct PendingRecord {
    id: String,
    text: String,
    metadata: Metadata,
}

/// Streams tabular records into a collection without holding the full
/// embedded set in memory.
///
/// One logical writer per collection: concurrent runs against the same
/// collection must be serialized by the caller. Aborting between chunks is
/// safe; every committed chunk is independently durable.
pub struct BatchIngestor {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    chunk_size: usize,
    min_text_len: usize,
}

impl BatchIngestor {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
        config: &IngestConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            collection: collection.into(),
            chunk_size: config.chunk_size.max(1),
            min_text_len: config.min_text_len,
        }
    }

    /// Ingest all records, committing every `chunk_size` validated records as
    /// one store call. A failing chunk is counted and logged, never aborts
    /// the run. Record ids come from stable source keys, so re-running after
    /// a partial failure upserts instead of duplicating.
    pub async fn ingest<R: SourceRecord>(
        &self,
        records: impl IntoIterator<Item = R>,
    ) -> Result<IngestReport, IngestError> {
        self.store
            .get_or_create_collection(&self.collection, Metric::Cosine)
            .await?;

        let mut report = IngestReport::default();
        let mut buffer: Vec<PendingRecord> = Vec::with_capacity(self.chunk_size);

        for record in records {
            report.attempted += 1;

            let text = record.text().trim();
            if text.chars().count() < self.min_text_len {
                debug!(id = %record.doc_id(), "skipping under-length record");
                report.skipped += 1;
                continue;
            }

            buffer.push(PendingRecord {
                id: record.doc_id(),
                text: text.to_string(),
                metadata: record.metadata(),
            });

            if buffer.len() >= self.chunk_size {
                self.commit_chunk(&mut buffer, &mut report).await;
            }
        }

        // Flush the final partial chunk.
        if !buffer.is_empty() {
            self.commit_chunk(&mut buffer, &mut report).await;
        }

        debug_assert!(report.is_complete());
        debug!(
            collection = %self.collection,
            attempted = report.attempted,
            committed = report.committed,
            skipped = report.skipped,
            failed = report.failed,
            "ingestion run finished"
        );
        Ok(report)
    }

    async fn commit_chunk(&self, buffer: &mut Vec<PendingRecord>, report: &mut IngestReport) {
        let chunk = std::mem::take(buffer);
        let count = chunk.len();

        match self.embed_and_commit(chunk).await {
            Ok(()) => {
                debug!(collection = %self.collection, count, "committed chunk");
                report.committed += count;
            }
            Err(e) => {
                warn!(collection = %self.collection, count, error = %e, "chunk failed");
                report.failed += count;
            }
        }
    }

    async fn embed_and_commit(&self, chunk: Vec<PendingRecord>) -> Result<()> {
        let texts: Vec<String> = chunk.iter().map(|r| r.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(texts)
            .await
            .context("failed to generate embeddings")?;

        let ingested_at = chrono::Utc::now().to_rfc3339();
        let documents: Vec<Document> = chunk
            .into_iter()
            .zip(embeddings.into_iter())
            .map(|(record, vector)| {
                let mut metadata = record.metadata;
                metadata.insert("checksum", checksum(&record.text));
                metadata.insert("ingested_at", ingested_at.clone());
                Document::new(record.id, vector, record.text, metadata)
            })
            .collect();

        self.store
            .add(&self.collection, documents)
            .await
            .context("failed to commit chunk")?;

        Ok(())
    }
}

fn checksum(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(text.as_bytes());
    hex::encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::StoreError;
    use crate::models::MetadataFilter;
    use crate::services::embedding::testing::{FailingEmbedder, StubEmbedder};
    use crate::services::vector_store::{MemoryBackend, QueryHit};

    struct TestRecord {
        key: String,
        text: String,
    }

    impl TestRecord {
        fn new(key: usize, text: impl Into<String>) -> Self {
            Self {
                key: key.to_string(),
                text: text.into(),
            }
        }
    }

    impl SourceRecord for TestRecord {
        fn doc_id(&self) -> String {
            format!("resume_{}", self.key)
        }

        fn text(&self) -> &str {
            &self.text
        }

        fn metadata(&self) -> Metadata {
            Metadata::new().with("resume_id", self.key.clone())
        }
    }

    fn long_text(key: usize) -> String {
        format!("experienced software engineer number {key} with cloud skills")
    }

    /// Store wrapper that counts `add` calls and can fail a chosen one.
    struct CountingStore {
        inner: MemoryBackend,
        add_calls: AtomicUsize,
        fail_on_call: Option<usize>,
    }

    impl CountingStore {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                inner: MemoryBackend::in_memory(),
                add_calls: AtomicUsize::new(0),
                fail_on_call,
            }
        }
    }

    #[async_trait]
    impl VectorStore for CountingStore {
        async fn get_or_create_collection(
            &self,
            name: &str,
            metric: Metric,
        ) -> Result<(), StoreError> {
            self.inner.get_or_create_collection(name, metric).await
        }

        async fn add(&self, collection: &str, documents: Vec<Document>) -> Result<(), StoreError> {
            let call = self.add_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_call == Some(call) {
                return Err(StoreError::Unavailable("injected failure".to_string()));
            }
            self.inner.add(collection, documents).await
        }

        async fn query(
            &self,
            collection: &str,
            query_vector: &[f32],
            k: usize,
            filter: Option<&MetadataFilter>,
        ) -> Result<Vec<QueryHit>, StoreError> {
            self.inner.query(collection, query_vector, k, filter).await
        }

        async fn count(&self, collection: &str) -> Result<usize, StoreError> {
            self.inner.count(collection).await
        }

        async fn get_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
            self.inner.get_all(collection).await
        }

        async fn flush(&self) -> Result<(), StoreError> {
            self.inner.flush().await
        }
    }

    fn ingestor(store: Arc<dyn VectorStore>) -> BatchIngestor {
        BatchIngestor::new(
            store,
            Arc::new(StubEmbedder::new(32)),
            "resumes",
            &IngestConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_65_records_commit_in_three_chunks() {
        let store = Arc::new(CountingStore::new(None));
        let ingestor = ingestor(store.clone());

        let records: Vec<TestRecord> = (0..65).map(|i| TestRecord::new(i, long_text(i))).collect();
        let report = ingestor.ingest(records).await.unwrap();

        // chunk_size 32: commits of 32, 32 and 1
        assert_eq!(store.add_calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.attempted, 65);
        assert_eq!(report.committed, 65);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.failed, 0);
        assert!(report.is_complete());
        assert_eq!(store.count("resumes").await.unwrap(), 65);
    }

    #[tokio::test]
    async fn test_short_record_is_skipped_not_failed() {
        let store = Arc::new(CountingStore::new(None));
        let ingestor = ingestor(store.clone());

        let records = vec![
            TestRecord::new(0, "too short"), // 9 chars
            TestRecord::new(1, long_text(1)),
            TestRecord::new(2, ""),
        ];
        let report = ingestor.ingest(records).await.unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.committed, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(store.count("resumes").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_abort_run() {
        // Second of three add calls fails; its 32 records are reported
        // failed and the remaining chunk still commits.
        let store = Arc::new(CountingStore::new(Some(2)));
        let ingestor = ingestor(store.clone());

        let records: Vec<TestRecord> = (0..65).map(|i| TestRecord::new(i, long_text(i))).collect();
        let report = ingestor.ingest(records).await.unwrap();

        assert_eq!(store.add_calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.attempted, 65);
        assert_eq!(report.committed, 33);
        assert_eq!(report.failed, 32);
        assert_eq!(report.skipped, 0);
        assert!(report.is_complete());
        assert_eq!(store.count("resumes").await.unwrap(), 33);
    }

    #[tokio::test]
    async fn test_embedding_failure_counts_chunk_failed() {
        let store = Arc::new(MemoryBackend::in_memory());
        let ingestor = BatchIngestor::new(
            store.clone(),
            Arc::new(FailingEmbedder),
            "resumes",
            &IngestConfig::default(),
        );

        let records: Vec<TestRecord> = (0..5).map(|i| TestRecord::new(i, long_text(i))).collect();
        let report = ingestor.ingest(records).await.unwrap();

        assert_eq!(report.attempted, 5);
        assert_eq!(report.failed, 5);
        assert_eq!(report.committed, 0);
        assert!(report.is_complete());
        assert_eq!(store.count("resumes").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reingestion_upserts_without_duplicates() {
        let store = Arc::new(MemoryBackend::in_memory());
        let ingestor = ingestor(store.clone());

        let first: Vec<TestRecord> = (0..10).map(|i| TestRecord::new(i, long_text(i))).collect();
        ingestor.ingest(first).await.unwrap();
        assert_eq!(store.count("resumes").await.unwrap(), 10);

        // Same keys, updated text: count unchanged, latest fields win.
        let second: Vec<TestRecord> = (0..10)
            .map(|i| TestRecord::new(i, format!("{} updated with new role", long_text(i))))
            .collect();
        let report = ingestor.ingest(second).await.unwrap();

        assert_eq!(report.committed, 10);
        assert_eq!(store.count("resumes").await.unwrap(), 10);
        let all = store.get_all("resumes").await.unwrap();
        assert!(all.iter().all(|d| d.text.contains("updated with new role")));
    }

    #[tokio::test]
    async fn test_documents_carry_checksum_metadata() {
        let store = Arc::new(MemoryBackend::in_memory());
        let ingestor = ingestor(store.clone());

        ingestor
            .ingest(vec![TestRecord::new(0, long_text(0))])
            .await
            .unwrap();

        let all = store.get_all("resumes").await.unwrap();
        assert_eq!(all.len(), 1);
        let checksum = all[0].metadata.get_str_or("checksum", "");
        assert_eq!(checksum.len(), 64);
        assert!(!all[0].metadata.get_str_or("ingested_at", "").is_empty());
        assert_eq!(all[0].metadata.get_str_or("resume_id", ""), "0");
    }

    #[tokio::test]
    async fn test_empty_input_produces_empty_report() {
        let store = Arc::new(CountingStore::new(None));
        let ingestor = ingestor(store.clone());

        let report = ingestor.ingest(Vec::<TestRecord>::new()).await.unwrap();
        assert_eq!(report, IngestReport::default());
        assert_eq!(store.add_calls.load(Ordering::SeqCst), 0);
    }
}
