pub mod chat;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::applications::handlers as applications;
use crate::jobs::handlers as jobs;
use crate::orchestrator::handlers as outputs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(health::index_handler))
        .route("/health", get(health::health_handler))
        // Agent outputs
        .route("/outputs", get(outputs::handle_all_outputs))
        .route("/outputs/:agent", get(outputs::handle_agent_output))
        // Job postings and the audit chain
        .route("/addjob", post(jobs::handle_add_job))
        .route("/getjobs", get(jobs::handle_get_jobs))
        .route("/updatejob/:id", put(jobs::handle_update_job))
        .route("/deletejob/:id", delete(jobs::handle_delete_job))
        .route("/chain", get(jobs::handle_get_chain))
        .route("/addBlock", post(jobs::handle_add_block))
        // Applications; the single segment after /applications is a job id
        // on GET and an application id everywhere else.
        .route("/applications", post(applications::handle_submit_application))
        .route("/applications/:id", get(applications::handle_list_applications))
        .route(
            "/applications/:id/status",
            patch(applications::handle_update_status),
        )
        .route(
            "/applications/:id/assessment/start",
            post(applications::handle_start_assessment),
        )
        .route(
            "/applications/:id/assessment/submit",
            post(applications::handle_submit_assessment),
        )
        .route(
            "/agent/assessment/generate",
            post(applications::handle_generate_assessment),
        )
        .route(
            "/agent/assessment/evaluate",
            post(applications::handle_evaluate_assessment),
        )
        .route("/chat", post(chat::chat_handler))
        .layer(body_limit)
        .with_state(state)
}
