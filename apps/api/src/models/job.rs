use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of the jobs document. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub level: String,
    #[serde(rename = "type", default)]
    pub job_type: String,
    #[serde(default)]
    pub description: String,
}

/// Request body for creating or replacing a posting.
#[derive(Debug, Clone, Deserialize)]
pub struct JobInput {
    pub title: String,
    pub department: String,
    pub location: String,
    pub level: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub description: String,
}

impl JobInput {
    pub fn into_posting(self, id: i64) -> JobPosting {
        JobPosting {
            id,
            title: self.title,
            department: self.department,
            location: self.location,
            level: self.level,
            job_type: self.job_type,
            description: self.description,
        }
    }
}

/// `{ "jobs": [...] }`. Other top-level keys are carried through rewrites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsDocument {
    #[serde(default)]
    pub jobs: Vec<JobPosting>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobsDocument {
    /// Next id: previous maximum plus one, or 1 for an empty list. `None`
    /// once the maximum is `i64::MAX`.
    pub fn next_id(&self) -> Option<i64> {
        self.jobs.iter().map(|j| j.id).max().unwrap_or(0).checked_add(1)
    }

    pub fn find(&self, id: i64) -> Option<&JobPosting> {
        self.jobs.iter().find(|j| j.id == id)
    }
}
