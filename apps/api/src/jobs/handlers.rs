use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::parse_job_id;
use crate::errors::{AppError, JsonBody};
use crate::models::chain::Block;
use crate::models::job::{JobInput, JobsDocument};
use crate::state::AppState;

#[derive(Serialize)]
pub struct AddJobResponse {
    pub message: String,
    pub job_id: i64,
}

#[derive(Deserialize)]
pub struct BlockInput {
    /// Block content without `block_no`.
    pub data: Map<String, Value>,
}

#[derive(Serialize)]
pub struct AddBlockResponse {
    pub message: String,
    pub block: Block,
}

/// POST /addjob
pub async fn handle_add_job(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<JobInput>,
) -> Result<Json<AddJobResponse>, AppError> {
    let job = state.jobs.add(input).await?;
    Ok(Json(AddJobResponse {
        message: "Job added successfully!".to_string(),
        job_id: job.id,
    }))
}

/// GET /getjobs
pub async fn handle_get_jobs(State(state): State<AppState>) -> Result<Json<JobsDocument>, AppError> {
    Ok(Json(state.jobs.list().await?))
}

/// PUT /updatejob/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(input): JsonBody<JobInput>,
) -> Result<Json<Value>, AppError> {
    let id = parse_job_id(&raw_id)?;
    state
        .jobs
        .update(id, input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job with ID {id} not found.")))?;
    Ok(Json(json!({ "message": format!("Job ID {id} updated successfully!") })))
}

/// DELETE /deletejob/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_job_id(&raw_id)?;
    if !state.jobs.delete(id).await? {
        return Err(AppError::NotFound(format!("Job with ID {id} not found.")));
    }
    Ok(Json(json!({ "message": format!("Job ID {id} deleted successfully!") })))
}

/// GET /chain
pub async fn handle_get_chain(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.chain.get().await?))
}

/// POST /addBlock
pub async fn handle_add_block(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<BlockInput>,
) -> Result<Json<AddBlockResponse>, AppError> {
    let block = state.chain.append(input.data).await?;
    Ok(Json(AddBlockResponse {
        message: format!("Block #{} added!", block.block_no),
        block,
    }))
}
