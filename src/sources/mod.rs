//! Tabular record sources for ingestion.

pub mod jobs;
pub mod resumes;

pub use jobs::{JobRecord, read_jobs};
pub use resumes::{ResumeRecord, read_resumes};
