//! Agents: stateless units that turn a payload into a model prompt, call the
//! Model Gateway, and recover structured output from the free-text reply.
//!
//! Periodic agents read the HR dataset on every run and are driven by the
//! orchestrator. The assessment agent is invoked inline by HTTP handlers.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm_client::{LlmError, ModelGateway};

pub mod assessment;
pub mod company_news;
pub mod dataset;
pub mod hr_analytics;
pub mod payroll;
pub mod prompts;
pub mod recovery;
pub mod task_distribution;

use dataset::HrDataset;
use recovery::ExpectedShape;

// ────────────────────────────────────────────────────────────────────────────
// Results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The attempt itself faulted: dataset unreadable, gateway error, panic.
    Fault,
    /// The cleaned model text is not JSON.
    MalformedOutput,
    /// The model text is JSON but not the shape the agent asked for.
    UnexpectedShape,
    /// The attempt overran the configured per-agent deadline.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFailure {
    pub kind: FailureKind,
    pub error: String,
    /// Cleaned model text, present whenever the model actually answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

/// Outcome of one agent run. Superseded, never merged, by the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentResult {
    Success { output: Value },
    Failure(AgentFailure),
}

impl AgentResult {
    pub fn success(output: Value) -> Self {
        AgentResult::Success { output }
    }

    pub fn failure(kind: FailureKind, error: impl Into<String>, raw_output: Option<String>) -> Self {
        AgentResult::Failure(AgentFailure {
            kind,
            error: error.into(),
            raw_output,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AgentResult::Success { .. })
    }

    /// HTTP view: a success is the bare payload, a failure is an error record.
    pub fn view(&self) -> Value {
        match self {
            AgentResult::Success { output } => output.clone(),
            AgentResult::Failure(failure) => json!({
                "error": failure.error,
                "kind": failure.kind,
                "raw_output": failure.raw_output,
            }),
        }
    }
}

/// Faults raised by an attempt, as opposed to a bad model answer.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Failed to read HR dataset at {path}: {source}")]
    DatasetIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HR dataset at {path} is not valid JSON: {source}")]
    DatasetFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model gateway error: {0}")]
    Gateway(#[from] LlmError),
}

// ────────────────────────────────────────────────────────────────────────────
// Agent contract
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> &str;

    /// Runs once. Model-output problems are `Ok(AgentResult::Failure)`;
    /// `Err` is reserved for faults of the attempt itself.
    async fn run(&self) -> Result<AgentResult, AgentError>;
}

/// What distinguishes one periodic agent from another: its identifier,
/// the prompt it renders from the dataset, and the shape it expects back.
pub trait Briefing: Send + Sync + 'static {
    const ID: &'static str;
    type Output: ExpectedShape;

    fn render_prompt(dataset: &HrDataset) -> String;
}

/// A periodic agent that loads the HR dataset fresh on every run.
pub struct DatasetAgent<B> {
    gateway: Arc<dyn ModelGateway>,
    dataset_path: PathBuf,
    briefing: PhantomData<fn() -> B>,
}

impl<B: Briefing> DatasetAgent<B> {
    pub fn new(gateway: Arc<dyn ModelGateway>, dataset_path: PathBuf) -> Self {
        Self {
            gateway,
            dataset_path,
            briefing: PhantomData,
        }
    }
}

#[async_trait]
impl<B: Briefing> Agent for DatasetAgent<B> {
    fn id(&self) -> &str {
        B::ID
    }

    async fn run(&self) -> Result<AgentResult, AgentError> {
        let dataset = HrDataset::load(&self.dataset_path).await?;
        let prompt = B::render_prompt(&dataset);
        let raw = self.gateway.generate(&prompt).await?;
        Ok(recovery::recover::<B::Output>(&raw))
    }
}

/// The fixed, ordered registration used by the orchestrator.
pub fn default_agents(gateway: Arc<dyn ModelGateway>, dataset_path: PathBuf) -> Vec<Arc<dyn Agent>> {
    vec![
        Arc::new(DatasetAgent::<hr_analytics::HrAnalytics>::new(
            Arc::clone(&gateway),
            dataset_path.clone(),
        )),
        Arc::new(DatasetAgent::<company_news::CompanyNews>::new(
            Arc::clone(&gateway),
            dataset_path.clone(),
        )),
        Arc::new(DatasetAgent::<task_distribution::TaskDistribution>::new(
            Arc::clone(&gateway),
            dataset_path.clone(),
        )),
        Arc::new(DatasetAgent::<payroll::Payroll>::new(gateway, dataset_path)),
    ]
}

/// A task line every periodic agent emits, tagged with the agent's number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTask {
    #[serde(rename = "Agent_ID")]
    pub agent_id: u32,
    pub task_description: String,
}

pub(crate) fn check_task_owner(tasks: &[AgentTask], expected: u32) -> Result<(), String> {
    match tasks.iter().find(|t| t.agent_id != expected) {
        Some(task) => Err(format!(
            "task '{}' is tagged Agent_ID {} instead of {expected}",
            task.task_description, task.agent_id
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::testing::ScriptedGateway;

    const DATASET: &str = r#"{
        "employees": [
            {"name": "Asha", "department": "Engineering", "role": "Developer"},
            {"name": "Ben", "department": "Sales", "role": "Account Executive"}
        ],
        "company_news": [{"headline": "Opening a Berlin office"}],
        "notifications": [{"from": "CEO", "message": "Hire two SREs"}],
        "performance_reports": {"Asha": "exceeds"}
    }"#;

    fn dataset_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DATASET.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_result_storage_form_is_tagged() {
        let ok = AgentResult::success(json!({"Analysis": "fine"}));
        let stored = serde_json::to_value(&ok).unwrap();
        assert_eq!(stored["status"], "success");
        assert_eq!(stored["output"]["Analysis"], "fine");

        let failed = AgentResult::failure(FailureKind::MalformedOutput, "Failed to parse JSON", Some("oops".into()));
        let stored = serde_json::to_value(&failed).unwrap();
        assert_eq!(stored["status"], "failure");
        assert_eq!(stored["kind"], "malformed_output");
        let back: AgentResult = serde_json::from_value(stored).unwrap();
        assert_eq!(back, failed);
    }

    #[test]
    fn test_success_payload_with_error_key_survives_storage() {
        let ok = AgentResult::success(json!({"error": "model chose this key"}));
        let back: AgentResult = serde_json::from_str(&serde_json::to_string(&ok).unwrap()).unwrap();
        assert!(back.is_success());
    }

    #[test]
    fn test_view_renders_bare_payload_or_error_record() {
        let ok = AgentResult::success(json!({"tasks": []}));
        assert_eq!(ok.view(), json!({"tasks": []}));

        let failed = AgentResult::failure(FailureKind::Fault, "connection reset", None);
        let view = failed.view();
        assert_eq!(view["error"], "connection reset");
        assert_eq!(view["kind"], "fault");
        assert!(view["raw_output"].is_null());
    }

    #[test]
    fn test_check_task_owner() {
        let tasks = vec![
            AgentTask { agent_id: 2, task_description: "a".into() },
            AgentTask { agent_id: 3, task_description: "b".into() },
        ];
        assert!(check_task_owner(&tasks[..1], 2).is_ok());
        let err = check_task_owner(&tasks, 2).unwrap_err();
        assert!(err.contains("'b'"));
    }

    #[test]
    fn test_default_agents_registration_order() {
        let gateway: Arc<dyn ModelGateway> = Arc::new(ScriptedGateway::always("{}"));
        let agents = default_agents(gateway, PathBuf::from("unused.json"));
        let ids: Vec<&str> = agents.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["Agent1", "Agent2", "Agent3", "Agent5"]);
    }

    #[tokio::test]
    async fn test_dataset_agent_recovers_fenced_reply() {
        let file = dataset_file();
        let reply = "```json\n{\"Analysis\": \"Berlin expansion\", \"Company_news\": [], \"tasks\": [{\"Agent_ID\": 2, \"task_description\": \"Post Berlin roles\"}]}\n```";
        let gateway = Arc::new(ScriptedGateway::always(reply));
        let agent = DatasetAgent::<company_news::CompanyNews>::new(
            gateway.clone(),
            file.path().to_path_buf(),
        );

        let result = agent.run().await.unwrap();
        match result {
            AgentResult::Success { output } => {
                assert_eq!(output["tasks"][0]["task_description"], "Post Berlin roles")
            }
            other => panic!("expected success, got {other:?}"),
        }
        let prompts = gateway.prompts();
        assert!(prompts[0].contains("Opening a Berlin office"));
    }

    #[tokio::test]
    async fn test_dataset_agent_missing_file_is_a_fault() {
        let gateway = Arc::new(ScriptedGateway::always("{}"));
        let agent = DatasetAgent::<hr_analytics::HrAnalytics>::new(
            gateway.clone(),
            PathBuf::from("/definitely/not/here.json"),
        );
        let err = agent.run().await.unwrap_err();
        assert!(matches!(err, AgentError::DatasetIo { .. }));
        assert!(gateway.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_dataset_agent_gateway_error_is_a_fault() {
        let file = dataset_file();
        let gateway = Arc::new(ScriptedGateway::failing("upstream 503"));
        let agent = DatasetAgent::<payroll::Payroll>::new(gateway, file.path().to_path_buf());
        let err = agent.run().await.unwrap_err();
        assert!(matches!(err, AgentError::Gateway(_)));
        assert!(err.to_string().contains("upstream 503"));
    }
}
