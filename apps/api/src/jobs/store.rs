use std::sync::Arc;

use serde_json::Value;

use super::file_store::{FileStore, StoreError};
use crate::models::job::{JobInput, JobPosting, JobsDocument};

/// Job postings kept in one JSON document, rewritten whole on every change.
#[derive(Clone)]
pub struct JobStore {
    files: Arc<dyn FileStore>,
    path: String,
}

impl JobStore {
    pub fn new(files: Arc<dyn FileStore>, path: impl Into<String>) -> Self {
        Self {
            files,
            path: path.into(),
        }
    }

    fn parse(&self, content: &str) -> Result<JobsDocument, StoreError> {
        serde_json::from_str(content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Lenient read used before an append. Blank content, a non-object
    /// document or a missing `jobs` list start over with an empty list.
    /// Content that is not JSON at all is refused rather than overwritten.
    fn parse_for_append(&self, content: &str) -> Result<JobsDocument, StoreError> {
        if content.trim().is_empty() {
            return Ok(JobsDocument::default());
        }
        let value: Value = serde_json::from_str(content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let Value::Object(mut root) = value else {
            return Ok(JobsDocument::default());
        };
        let jobs = match root.remove("jobs") {
            Some(list @ Value::Array(_)) => {
                serde_json::from_value(list).map_err(|source| StoreError::Parse {
                    path: self.path.clone(),
                    source,
                })?
            }
            _ => Vec::new(),
        };
        Ok(JobsDocument { jobs, extra: root })
    }

    fn render(&self, doc: &JobsDocument) -> Result<String, StoreError> {
        serde_json::to_string_pretty(doc).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub async fn list(&self) -> Result<JobsDocument, StoreError> {
        let file = self.files.fetch(&self.path).await?;
        self.parse(&file.content)
    }

    pub async fn find(&self, id: i64) -> Result<Option<JobPosting>, StoreError> {
        Ok(self.list().await?.find(id).cloned())
    }

    /// Appends a posting with id = previous maximum + 1.
    pub async fn add(&self, input: JobInput) -> Result<JobPosting, StoreError> {
        let file = self.files.fetch(&self.path).await?;
        let mut doc = self.parse_for_append(&file.content)?;

        let id = doc.next_id().ok_or_else(|| StoreError::InvalidDocument {
            path: self.path.clone(),
            detail: format!("no job id left after {}", i64::MAX),
        })?;
        let job = input.into_posting(id);
        doc.jobs.push(job.clone());

        let message = format!("Added new job: {}", job.title);
        self.files
            .commit(&self.path, &self.render(&doc)?, &file.sha, &message)
            .await?;
        Ok(job)
    }

    /// Replaces the whole entry, keeping its id. `None` if no such id.
    pub async fn update(&self, id: i64, input: JobInput) -> Result<Option<JobPosting>, StoreError> {
        let file = self.files.fetch(&self.path).await?;
        let mut doc = self.parse(&file.content)?;

        let Some(slot) = doc.jobs.iter_mut().find(|j| j.id == id) else {
            return Ok(None);
        };
        let job = input.into_posting(id);
        *slot = job.clone();

        let message = format!("Updated job ID {id}: {}", job.title);
        self.files
            .commit(&self.path, &self.render(&doc)?, &file.sha, &message)
            .await?;
        Ok(Some(job))
    }

    /// `false` if no such id; the stored document is then left untouched.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let file = self.files.fetch(&self.path).await?;
        let mut doc = self.parse(&file.content)?;

        let before = doc.jobs.len();
        doc.jobs.retain(|j| j.id != id);
        if doc.jobs.len() == before {
            return Ok(false);
        }

        let message = format!("Deleted job ID {id}");
        self.files
            .commit(&self.path, &self.render(&doc)?, &file.sha, &message)
            .await?;
        Ok(true)
    }
}
