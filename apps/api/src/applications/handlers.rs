use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::assessment::{start_assessment, submit_assessment};
use super::extract::{extract_text_blocking, DocumentKind};
use crate::agents::assessment::{evaluate_responses, generate_questions};
use crate::errors::{AppError, JsonBody};
use crate::models::application::{Application, ApplicationStatus, NewApplication, ResumeMetadata};
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Serialize)]
pub struct SubmitApplicationResponse {
    pub message: String,
    pub application_id: Uuid,
}

#[derive(Serialize)]
pub struct ApplicationListResponse {
    pub job_id: String,
    pub applications: Vec<Application>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Deserialize)]
pub struct AssessmentAnswers {
    pub answers: Vec<Value>,
}

#[derive(Deserialize)]
pub struct GenerateAssessmentRequest {
    pub job_description: String,
    pub applicant_cv: String,
}

#[derive(Deserialize)]
pub struct EvaluateAssessmentRequest {
    pub questions_with_answers: Value,
    pub user_responses: Value,
}

fn parse_application_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("Invalid application id '{raw}'")))
}

#[derive(Default)]
struct ApplicationForm {
    job_id: Option<String>,
    job_title: Option<String>,
    full_name: Option<String>,
    phone: Option<String>,
    years_exp: Option<String>,
    resume: Option<ResumeUpload>,
}

struct ResumeUpload {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("Missing required field '{field}'")))
}

async fn read_form(mut multipart: Multipart) -> Result<ApplicationForm, AppError> {
    let bad_body = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("Invalid multipart body: {e}"))
    };

    let mut form = ApplicationForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_body)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "resume" {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(bad_body)?;
            form.resume = Some(ResumeUpload {
                filename,
                content_type,
                bytes,
            });
            continue;
        }

        let value = field.text().await.map_err(bad_body)?;
        match name.as_str() {
            "job_id" => form.job_id = Some(value),
            "job_title" => form.job_title = Some(value),
            "full_name" => form.full_name = Some(value),
            "phone" => form.phone = Some(value),
            "years_exp" => form.years_exp = Some(value),
            _ => {}
        }
    }
    Ok(form)
}

/// POST /applications
/// Multipart intake: form fields plus a `resume` file, stored as extracted text.
pub async fn handle_submit_application(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmitApplicationResponse>, AppError> {
    let form = read_form(multipart?).await?;

    let job_id = required(form.job_id, "job_id")?;
    let full_name = required(form.full_name, "full_name")?;
    let phone = required(form.phone, "phone")?;
    let years_raw = required(form.years_exp, "years_exp")?;
    let years_exp: i64 = years_raw.trim().parse().map_err(|_| {
        AppError::Validation(format!("years_exp must be an integer, got '{years_raw}'"))
    })?;
    let resume = form
        .resume
        .ok_or_else(|| AppError::Validation("Missing required field 'resume'".to_string()))?;

    let kind = DocumentKind::from_filename(resume.filename.as_deref().unwrap_or_default())?;
    let resume_text = extract_text_blocking(kind, resume.bytes).await?;

    let application_id = state
        .applications
        .create(NewApplication {
            job_id,
            job_title: form.job_title,
            full_name,
            phone,
            years_exp,
            resume: ResumeMetadata {
                filename: resume.filename,
                content_type: Some(
                    resume
                        .content_type
                        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                ),
            },
            resume_text,
        })
        .await?;

    Ok(Json(SubmitApplicationResponse {
        message: "Application submitted successfully!".to_string(),
        application_id,
    }))
}

/// GET /applications/:job_id
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let applications = state.applications.list_by_job(&job_id).await?;
    Ok(Json(ApplicationListResponse {
        job_id,
        applications,
    }))
}

/// PATCH /applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(req): JsonBody<StatusUpdate>,
) -> Result<Json<Value>, AppError> {
    let id = parse_application_id(&raw_id)?;
    let status = req
        .status
        .parse::<ApplicationStatus>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let application = state
        .applications
        .update_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    Ok(Json(json!({
        "message": "Status updated successfully",
        "application": application,
    })))
}

/// POST /applications/:id/assessment/start
pub async fn handle_start_assessment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_application_id(&raw_id)?;
    let questions =
        start_assessment(state.applications.as_ref(), &state.jobs, state.model.as_ref(), id).await?;
    Ok(Json(json!({
        "application_id": id,
        "questions": questions,
    })))
}

/// POST /applications/:id/assessment/submit
pub async fn handle_submit_assessment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(req): JsonBody<AssessmentAnswers>,
) -> Result<Json<Value>, AppError> {
    let id = parse_application_id(&raw_id)?;
    let result = submit_assessment(
        state.applications.as_ref(),
        state.model.as_ref(),
        id,
        Value::Array(req.answers),
    )
    .await?;
    Ok(Json(json!({
        "application_id": id,
        "result": result,
    })))
}

/// POST /agent/assessment/generate
/// Stateless: nothing is persisted.
pub async fn handle_generate_assessment(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GenerateAssessmentRequest>,
) -> Result<Json<Value>, AppError> {
    let set = generate_questions(state.model.as_ref(), &req.job_description, &req.applicant_cv).await?;
    Ok(Json(serde_json::to_value(set).map_err(anyhow::Error::from)?))
}

/// POST /agent/assessment/evaluate
pub async fn handle_evaluate_assessment(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EvaluateAssessmentRequest>,
) -> Result<Json<Value>, AppError> {
    let evaluation = evaluate_responses(
        state.model.as_ref(),
        &req.questions_with_answers,
        &req.user_responses,
    )
    .await?;
    Ok(Json(serde_json::to_value(evaluation).map_err(anyhow::Error::from)?))
}
