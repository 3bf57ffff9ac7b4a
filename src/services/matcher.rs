//! Query-path facade for resume/job matching.

use std::sync::Arc;

use tracing::debug;

use super::embedding::Embedder;
use super::vector_store::{Metric, VectorStore};
use crate::error::MatchError;
use crate::models::{CollectionsConfig, MatchRequest, MetadataFilter, SearchResult};

/// Candidates fetched per requested result, absorbing threshold-filter
/// losses. A heuristic: if filtering still leaves fewer than `n_results`,
/// fewer are returned, never padded.
const OVERFETCH_FACTOR: usize = 2;

/// High-level API for resume/job matching.
///
/// Holds an injected store and embedder; construct once at startup with
/// [`Matcher::new`] and call [`Matcher::close`] at shutdown. Read-only
/// against the store, so concurrent callers are fine.
pub struct Matcher {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collections: CollectionsConfig,
}

impl Matcher {
    /// Create the matcher and ensure both configured collections exist.
    pub async fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collections: CollectionsConfig,
    ) -> Result<Self, MatchError> {
        store
            .get_or_create_collection(&collections.resumes, Metric::Cosine)
            .await?;
        store
            .get_or_create_collection(&collections.jobs, Metric::Cosine)
            .await?;

        Ok(Self {
            store,
            embedder,
            collections,
        })
    }

    /// Find the documents most similar to a pre-computed query vector.
    ///
    /// Over-fetches `2 x n_results` candidates with the filter pushed down to
    /// the store, converts distances to `1 - distance` similarity scores,
    /// drops candidates below `min_score`, sorts by similarity descending
    /// (stable, ties keep retrieval order) and truncates to `n_results`. An
    /// empty result is valid and means "nothing sufficiently similar".
    pub async fn find_similar(
        &self,
        collection: &str,
        query_vector: &[f32],
        request: &MatchRequest,
    ) -> Result<Vec<SearchResult>, MatchError> {
        validate(request)?;

        let hits = self
            .store
            .query(
                collection,
                query_vector,
                request.n_results * OVERFETCH_FACTOR,
                request.filter.as_ref(),
            )
            .await?;

        let mut results: Vec<SearchResult> = hits
            .into_iter()
            .map(|hit| SearchResult {
                similarity_score: 1.0 - hit.distance,
                id: hit.id,
                text: hit.text,
                metadata: hit.metadata,
                distance: hit.distance,
            })
            .filter(|r| r.similarity_score >= request.min_score)
            .collect();

        results.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        results.truncate(request.n_results);

        debug!(
            collection,
            returned = results.len(),
            min_score = request.min_score,
            "similarity query"
        );
        Ok(results)
    }

    /// Find best-matching jobs for a resume.
    pub async fn find_jobs_for_resume(
        &self,
        resume_text: &str,
        request: &MatchRequest,
    ) -> Result<Vec<SearchResult>, MatchError> {
        validate(request)?;
        let query_vector = self.embedder.embed_query(resume_text).await?;
        self.find_similar(&self.collections.jobs, &query_vector, request)
            .await
    }

    /// Find best-matching resumes for a job description, optionally limited
    /// to one resume category. Shares the ranking algorithm of
    /// [`find_similar`](Self::find_similar); only the collection and the
    /// predicate differ.
    pub async fn find_resumes_for_job(
        &self,
        job_title: &str,
        job_description: &str,
        category: Option<&str>,
        request: &MatchRequest,
    ) -> Result<Vec<SearchResult>, MatchError> {
        validate(request)?;

        // Title and description combined embed better than either alone.
        let combined_text = format!("{}. {}", job_title, job_description);
        let query_vector = self.embedder.embed_query(&combined_text).await?;

        let mut request = request.clone();
        if let Some(category) = category {
            request.filter = Some(MetadataFilter::equals("category", category));
        }

        self.find_similar(&self.collections.resumes, &query_vector, &request)
            .await
    }

    pub fn collections(&self) -> &CollectionsConfig {
        &self.collections
    }

    /// Flush the store. Call once at shutdown.
    pub async fn close(&self) -> Result<(), MatchError> {
        self.store.flush().await?;
        Ok(())
    }
}

/// Reject malformed parameters before any store or embedding call.
fn validate(request: &MatchRequest) -> Result<(), MatchError> {
    if request.n_results == 0 {
        return Err(MatchError::InvalidArgument(
            "n_results must be positive".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&request.min_score) {
        return Err(MatchError::InvalidArgument(format!(
            "min_score must be in [0, 1], got {}",
            request.min_score
        )));
    }
    Ok(())
}
