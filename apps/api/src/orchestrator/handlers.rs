use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{Map, Value};

use super::output_key;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /outputs
/// Latest result for every agent that has run at least once.
pub async fn handle_all_outputs(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let snapshot = state.outputs.snapshot().await?;
    if snapshot.is_empty() {
        return Err(AppError::NotFound(
            "No agent outputs available yet.".to_string(),
        ));
    }

    let body: Map<String, Value> = snapshot
        .iter()
        .map(|(key, result)| (key.clone(), result.view()))
        .collect();
    Ok(Json(Value::Object(body)))
}

/// GET /outputs/:agent
pub async fn handle_agent_output(
    State(state): State<AppState>,
    Path(agent): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .outputs
        .get(&output_key(&agent))
        .await?
        .map(|result| Json(result.view()))
        .ok_or_else(|| AppError::NotFound(format!("No output found for {agent}")))
}
