use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, JsonBody};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /chat
/// Single-turn prompt/response; no history is kept.
pub async fn chat_handler(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }
    let response = state.chat.generate(&req.message).await?;
    Ok(Json(ChatResponse { response }))
}
