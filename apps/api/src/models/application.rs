use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Onboarding,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Onboarding => "Onboarding",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Invalid status '{0}'. Expected one of Pending, Onboarding, Rejected")]
pub struct InvalidStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ApplicationStatus::Pending),
            "Onboarding" => Ok(ApplicationStatus::Onboarding),
            "Rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeMetadata {
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// An application as returned over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub id: Uuid,
    pub job_id: String,
    pub job_title: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub years_exp: i64,
    pub resume: ResumeMetadata,
    pub resume_text: String,
    pub status: ApplicationStatus,
    pub assessment_questions: Option<Value>,
    pub assessment_answers: Option<Value>,
    pub assessment_result: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: String,
    pub job_title: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub years_exp: i64,
    pub resume: ResumeMetadata,
    pub resume_text: String,
}

impl NewApplication {
    /// A stored application with a fresh id, `Pending` and no assessment yet.
    pub fn into_application(self, id: Uuid, created_at: DateTime<Utc>) -> Application {
        Application {
            id,
            job_id: self.job_id,
            job_title: self.job_title,
            full_name: self.full_name,
            phone: self.phone,
            years_exp: self.years_exp,
            resume: self.resume,
            resume_text: self.resume_text,
            status: ApplicationStatus::Pending,
            assessment_questions: None,
            assessment_answers: None,
            assessment_result: None,
            created_at,
        }
    }
}

/// Assessment fields written by the start and submit flows.
/// `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default)]
pub struct AssessmentUpdate {
    pub questions: Value,
    pub answers: Option<Value>,
    pub result: Option<Value>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: String,
    pub job_title: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub years_exp: i64,
    pub resume_filename: Option<String>,
    pub resume_content_type: Option<String>,
    pub resume_text: String,
    pub status: String,
    pub assessment_questions: Option<Value>,
    pub assessment_answers: Option<Value>,
    pub assessment_result: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = InvalidStatus;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        Ok(Application {
            id: row.id,
            job_id: row.job_id,
            job_title: row.job_title,
            full_name: row.full_name,
            phone: row.phone,
            years_exp: row.years_exp,
            resume: ResumeMetadata {
                filename: row.resume_filename,
                content_type: row.resume_content_type,
            },
            resume_text: row.resume_text,
            status: row.status.parse()?,
            assessment_questions: row.assessment_questions,
            assessment_answers: row.assessment_answers,
            assessment_result: row.assessment_result,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_exact() {
        assert_eq!(
            "Onboarding".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Onboarding
        );
        let err = "onboarding".parse::<ApplicationStatus>().unwrap_err();
        assert!(err.to_string().contains("'onboarding'"));
        assert!("Hired".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_new_application_starts_pending() {
        let app = NewApplication {
            job_id: "3".into(),
            job_title: None,
            full_name: "Asha Rao".into(),
            phone: "555-0100".into(),
            years_exp: 4,
            resume: ResumeMetadata::default(),
            resume_text: "Rust, Postgres".into(),
        }
        .into_application(Uuid::new_v4(), Utc::now());
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert!(app.assessment_questions.is_none());

        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["status"], "Pending");
        assert!(json["resume"]["filename"].is_null());
    }
}
