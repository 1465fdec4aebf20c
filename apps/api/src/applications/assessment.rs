//! Per-application assessment flow: generate questions from the job
//! description and the candidate's profile, then grade submitted answers.

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::store::ApplicationStore;
use crate::agents::assessment::{evaluate_responses, generate_questions};
use crate::errors::AppError;
use crate::jobs::store::JobStore;
use crate::llm_client::ModelGateway;
use crate::models::application::{Application, AssessmentUpdate};

/// Candidate profile handed to the question generator. Blank lines dropped.
pub fn candidate_profile(app: &Application) -> String {
    let lines = [
        format!("Job ID: {}", app.job_id),
        format!("Job Title: {}", app.job_title.as_deref().unwrap_or_default()),
        format!("Candidate Name: {}", app.full_name),
        format!("Phone: {}", app.phone),
        format!("Years of Experience: {}", app.years_exp),
        String::new(),
        "Resume Content:".to_string(),
        app.resume_text.clone(),
    ];
    lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

async fn load(applications: &dyn ApplicationStore, id: Uuid) -> Result<Application, AppError> {
    applications
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))
}

/// Generates and stores a question set. Returns it as stored.
pub async fn start_assessment(
    applications: &dyn ApplicationStore,
    jobs: &JobStore,
    model: &dyn ModelGateway,
    id: Uuid,
) -> Result<Value, AppError> {
    let app = load(applications, id).await?;

    if app.job_id.trim().is_empty() {
        return Err(AppError::Validation("Application has no job_id".to_string()));
    }
    let job_id: i64 = app
        .job_id
        .trim()
        .parse()
        .map_err(|_| AppError::Validation("Invalid job_id stored in application".to_string()))?;

    let job = jobs
        .find(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job description not found for id {job_id}")))?;

    let set = generate_questions(model, &job.description, &candidate_profile(&app)).await?;
    let questions = serde_json::to_value(&set).map_err(anyhow::Error::from)?;

    applications
        .save_assessment(
            id,
            AssessmentUpdate {
                questions: questions.clone(),
                answers: None,
                result: None,
            },
        )
        .await?;

    info!("Generated {} assessment questions for application {id}", set.questions.len());
    Ok(questions)
}

/// Grades `answers` against the stored questions and stores both with the result.
pub async fn submit_assessment(
    applications: &dyn ApplicationStore,
    model: &dyn ModelGateway,
    id: Uuid,
    answers: Value,
) -> Result<Value, AppError> {
    let app = load(applications, id).await?;

    let questions = match app.assessment_questions {
        Some(questions) if !is_blank(&questions) => questions,
        _ => {
            return Err(AppError::Validation(
                "No assessment questions found for this application".to_string(),
            ))
        }
    };

    let evaluation = evaluate_responses(model, &questions, &answers).await?;
    let result = serde_json::to_value(&evaluation).map_err(anyhow::Error::from)?;

    applications
        .save_assessment(
            id,
            AssessmentUpdate {
                questions,
                answers: Some(answers),
                result: Some(result.clone()),
            },
        )
        .await?;

    info!("Scored application {id}: {}", evaluation.score);
    Ok(result)
}
