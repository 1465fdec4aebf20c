use std::sync::Arc;

use crate::applications::store::ApplicationStore;
use crate::jobs::chain::ChainStore;
use crate::jobs::store::JobStore;
use crate::llm_client::ModelGateway;
use crate::orchestrator::outputs::OutputStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Read side of the agent output map; the orchestrator is the only writer.
    pub outputs: Arc<dyn OutputStore>,
    pub jobs: JobStore,
    pub chain: ChainStore,
    pub applications: Arc<dyn ApplicationStore>,
    /// Gateway used by the assessment agent.
    pub model: Arc<dyn ModelGateway>,
    /// Conversational gateway behind `/chat`.
    pub chat: Arc<dyn ModelGateway>,
    pub max_upload_bytes: usize,
}
