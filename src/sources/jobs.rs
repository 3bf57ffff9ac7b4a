//! Job description records from a cleaned CSV export.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::SourceError;
use crate::models::{Metadata, SourceRecord};

/// Titles are truncated to this length when stored as metadata.
const TITLE_METADATA_LEN: usize = 100;

#[derive(Debug, Deserialize)]
struct JobRow {
    #[serde(rename = "Job Title")]
    title: String,

    #[serde(rename = "Job Description")]
    description: String,
}

/// One job posting. The document text combines title and description, which
/// embeds better than either alone.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Zero-based row index in the source file; part of the stable id.
    pub row: usize,
    pub title: String,
    pub description: String,
    text: String,
    source: String,
}

impl JobRecord {
    pub fn new(
        row: usize,
        title: impl Into<String>,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let description = description.into();
        let text = format!("{}. {}", title, description);
        Self {
            row,
            title,
            description,
            text,
            source: source.into(),
        }
    }
}

impl SourceRecord for JobRecord {
    fn doc_id(&self) -> String {
        format!("job_{}", self.row)
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn metadata(&self) -> Metadata {
        let truncated_title: String = self.title.chars().take(TITLE_METADATA_LEN).collect();
        Metadata::new()
            .with("job_title", truncated_title)
            .with("job_index", self.row.to_string())
            .with("source", self.source.clone())
    }
}

/// Read job records from a CSV with `Job Title` and `Job Description`
/// columns. Rows with either column empty are dropped here; ids keep the
/// original row index so re-reads stay stable.
pub fn read_jobs(path: &Path) -> Result<Vec<JobRecord>, SourceError> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for (row, result) in reader.deserialize::<JobRow>().enumerate() {
        let job = result?;
        let title = job.title.trim();
        let description = job.description.trim();
        if title.is_empty() || description.is_empty() {
            continue;
        }
        records.push(JobRecord::new(row, title, description, source.clone()));
    }

    debug!(file = %source, count = records.len(), "read job records");
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
    fn test_read_jobs_builds_combined_text() {
        let file = write_csv(
            "Job Title,Job Description\n\
             Data Engineer,Build pipelines with Spark\n\
             Chef,Run a busy kitchen\n",
        );

        let records = read_jobs(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].doc_id(), "job_0");
        assert_eq!(records[0].text(), "Data Engineer. Build pipelines with Spark");
        assert_eq!(
            records[0].metadata().get_str_or("job_title", ""),
            "Data Engineer"
        );
    }

    #[test]
    fn test_rows_with_empty_fields_are_dropped_but_indices_kept() {
        let file = write_csv(
            "Job Title,Job Description\n\
             Data Engineer,Build pipelines\n\
             ,Missing title\n\
             Chef,Run a kitchen\n",
        );

        let records = read_jobs(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        // Row indices reflect the source file, not the filtered list.
        assert_eq!(records[1].doc_id(), "job_2");
    }

    #[test]
    fn test_title_truncated_in_metadata() {
        let long_title = "x".repeat(150);
        let record = JobRecord::new(0, long_title, "desc", "jobs.csv");
        let title = record.metadata().get_str_or("job_title", "").to_string();
        assert_eq!(title.len(), 100);
    }

    #[test]
    fn test_missing_file_errors() {
        let err = read_jobs(Path::new("/no/such/file.csv")).unwrap_err();
        assert!(matches!(err, SourceError::CsvError(_)));
    }
}
