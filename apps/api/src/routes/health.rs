use axum::Json;
use serde_json::{json, Value};

pub const SERVICE_NAME: &str = "orbit-api";

const ENDPOINTS: &[&str] = &[
    "/health",
    "/outputs",
    "/outputs/{agent}",
    "/addjob",
    "/getjobs",
    "/updatejob/{job_id}",
    "/deletejob/{job_id}",
    "/chain",
    "/addBlock",
    "/applications",
    "/applications/{job_id}",
    "/applications/{application_id}/status",
    "/applications/{application_id}/assessment/start",
    "/applications/{application_id}/assessment/submit",
    "/agent/assessment/generate",
    "/agent/assessment/evaluate",
    "/chat",
];

/// GET /
/// Service banner listing the available endpoints.
pub async fn index_handler() -> Json<Value> {
    Json(json!({
        "message": "Agent Output API is live",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": SERVICE_NAME
    }))
}
