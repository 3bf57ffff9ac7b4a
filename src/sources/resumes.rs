//! Resume records with pre-extracted text.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::SourceError;
use crate::models::{Metadata, SourceRecord};

#[derive(Debug, Deserialize)]
struct ResumeRow {
    resume_id: String,
    resume_text: String,
    #[serde(default)]
    category: Option<String>,
}

/// One resume. Under-length texts pass through here; the ingestor applies
/// the data-quality filter so they are counted as skips, not silently lost.
#[derive(Debug, Clone)]
pub struct ResumeRecord {
    pub resume_id: String,
    pub text: String,
    pub category: String,
    source: String,
}

impl ResumeRecord {
    pub fn new(
        resume_id: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            resume_id: resume_id.into(),
            text: text.into(),
            category: category.into(),
            source: source.into(),
        }
    }
}

impl SourceRecord for ResumeRecord {
    fn doc_id(&self) -> String {
        format!("resume_{}", self.resume_id)
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn metadata(&self) -> Metadata {
        Metadata::new()
            .with("resume_id", self.resume_id.clone())
            .with("category", self.category.clone())
            .with("source", self.source.clone())
    }
}

/// Read resume records from a CSV with `resume_id`, `resume_text` and
/// optional `category` columns.
pub fn read_resumes(path: &Path) -> Result<Vec<ResumeRecord>, SourceError> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for result in reader.deserialize::<ResumeRow>() {
        let row = result?;
        let category = row
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        records.push(ResumeRecord::new(
            row.resume_id.trim(),
            row.resume_text.trim(),
            category,
            source.clone(),
        ));
    }

    debug!(file = %source, count = records.len(), "read resume records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_resumes() {
        let file = write_csv(
            "resume_id,resume_text,category\n\
             101,Experienced accountant with audit background,FINANCE\n\
             102,Registered nurse with ICU experience,HEALTHCARE\n",
        );

        let records = read_resumes(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].doc_id(), "resume_101");
        assert_eq!(records[0].category, "FINANCE");
        assert_eq!(
            records[1].metadata().get_str_or("category", "unknown"),
            "HEALTHCARE"
        );
    }

    #[test]
    fn test_missing_category_defaults_to_unknown() {
        let file = write_csv(
            "resume_id,resume_text,category\n\
             103,Sales manager with regional experience,\n",
        );

        let records = read_resumes(file.path()).unwrap();
        assert_eq!(records[0].category, "unknown");
    }

    #[test]
    fn test_ids_stable_across_reads() {
        let file = write_csv(
            "resume_id,resume_text,category\n\
             7,Warehouse operations lead,LOGISTICS\n",
        );

        let first = read_resumes(file.path()).unwrap();
        let second = read_resumes(file.path()).unwrap();
        assert_eq!(first[0].doc_id(), second[0].doc_id());
    }
}
