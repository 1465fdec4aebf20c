//! Background orchestration loop.
//!
//! Two states: running a cycle and sleeping. A cycle attempts every
//! registered agent once, in registration order, and publishes each outcome
//! under `"<id>_Output"`. One agent's fault never stops the agents after it,
//! and never ends the loop.

use std::any::Any;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::agents::{Agent, AgentResult, FailureKind};

pub mod handlers;
pub mod outputs;

use outputs::OutputStore;

/// Key under which an agent's latest result is published.
pub fn output_key(agent_id: &str) -> String {
    format!("{agent_id}_Output")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Orchestrator {
    agents: Vec<Arc<dyn Agent>>,
    outputs: Arc<dyn OutputStore>,
    interval: Duration,
    agent_timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn new(
        agents: Vec<Arc<dyn Agent>>,
        outputs: Arc<dyn OutputStore>,
        interval: Duration,
    ) -> Self {
        Self {
            agents,
            outputs,
            interval,
            agent_timeout: None,
        }
    }

    /// Per-agent deadline. `None` leaves a slow gateway call unbounded.
    pub fn with_agent_timeout(mut self, agent_timeout: Option<Duration>) -> Self {
        self.agent_timeout = agent_timeout;
        self
    }

    pub async fn run_cycle(&self) -> CycleReport {
        info!("Running {} agents", self.agents.len());
        let mut report = CycleReport::default();

        for agent in &self.agents {
            let id = agent.id().to_string();
            let result = self.attempt(agent).await;

            match &result {
                AgentResult::Success { .. } => {
                    report.succeeded += 1;
                    info!(agent = %id, "Agent ran successfully");
                }
                AgentResult::Failure(failure) => {
                    report.failed += 1;
                    error!(agent = %id, kind = ?failure.kind, "Agent failed: {}", failure.error);
                }
            }

            if let Err(e) = self.outputs.publish(&output_key(&id), result).await {
                warn!(agent = %id, "Failed to publish agent output: {e}");
            }
        }

        report
    }

    /// Runs cycles forever with a fixed sleep in between.
    pub async fn run_forever(&self) {
        loop {
            let report = self.run_cycle().await;
            info!(
                succeeded = report.succeeded,
                failed = report.failed,
                "Cycle complete; sleeping for {} minutes",
                self.interval.as_secs_f64() / 60.0
            );
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Moves the loop onto its own OS thread with a single-threaded runtime,
    /// so it shares nothing with the API server but the output store.
    pub fn spawn_dedicated(self) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("orchestrator".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!("Failed to start orchestrator runtime: {e}");
                        return;
                    }
                };
                runtime.block_on(self.run_forever());
            })
    }

    /// One attempt in its own task, so a panic surfaces as a join error.
    async fn attempt(&self, agent: &Arc<dyn Agent>) -> AgentResult {
        let task_agent = Arc::clone(agent);
        let mut handle = tokio::spawn(async move { task_agent.run().await });

        let joined = match self.agent_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    return AgentResult::failure(
                        FailureKind::TimedOut,
                        format!("Agent did not finish within {} seconds", limit.as_secs()),
                        None,
                    );
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => AgentResult::failure(FailureKind::Fault, e.to_string(), None),
            Err(e) => AgentResult::failure(FailureKind::Fault, describe_join_error(e), None),
        }
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        format!("Agent panicked: {}", panic_message(err.into_panic()))
    } else {
        format!("Agent task was cancelled: {err}")
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::outputs::SharedOutputs;
    use super::*;
    use crate::agents::AgentError;
    use crate::llm_client::LlmError;

    enum Behaviour {
        Succeed(Value),
        Fault,
        Malformed,
        Panic,
        Hang,
        Count(AtomicUsize),
    }

    struct StubAgent {
        id: &'static str,
        behaviour: Behaviour,
    }

    impl StubAgent {
        fn new(id: &'static str, behaviour: Behaviour) -> Arc<dyn Agent> {
            Arc::new(Self { id, behaviour })
        }
    }

    #[async_trait]
    impl Agent for StubAgent {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self) -> Result<AgentResult, AgentError> {
            match &self.behaviour {
                Behaviour::Succeed(v) => Ok(AgentResult::success(v.clone())),
                Behaviour::Fault => Err(AgentError::Gateway(LlmError::Api {
                    status: 503,
                    message: "model overloaded".to_string(),
                })),
                Behaviour::Malformed => Ok(AgentResult::failure(
                    FailureKind::MalformedOutput,
                    "Failed to parse JSON",
                    Some("not json".to_string()),
                )),
                Behaviour::Panic => panic!("dataset section missing"),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(AgentResult::success(json!({})))
                }
                Behaviour::Count(n) => {
                    let round = n.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(AgentResult::success(json!({ "round": round })))
                }
            }
        }
    }

    fn orchestrator(agents: Vec<Arc<dyn Agent>>) -> (Orchestrator, SharedOutputs) {
        let outputs = SharedOutputs::new();
        let orch = Orchestrator::new(
            agents,
            Arc::new(outputs.clone()),
            Duration::from_secs(600),
        );
        (orch, outputs)
    }

    #[test]
    fn test_output_key() {
        assert_eq!(output_key("Agent3"), "Agent3_Output");
    }

    #[tokio::test]
    async fn test_one_fault_does_not_stop_the_cycle() {
        let (orch, outputs) = orchestrator(vec![
            StubAgent::new("Agent1", Behaviour::Succeed(json!({"a": 1}))),
            StubAgent::new("Agent2", Behaviour::Fault),
            StubAgent::new("Agent3", Behaviour::Succeed(json!({"c": 3}))),
        ]);

        let report = orch.run_cycle().await;
        assert_eq!(report, CycleReport { succeeded: 2, failed: 1 });

        let snapshot = outputs.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot["Agent1_Output"].is_success());
        assert!(snapshot["Agent3_Output"].is_success());
        match &snapshot["Agent2_Output"] {
            AgentResult::Failure(f) => {
                assert_eq!(f.kind, FailureKind::Fault);
                assert!(f.error.contains("model overloaded"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_output_is_stored_as_is() {
        let (orch, outputs) = orchestrator(vec![StubAgent::new("Agent1", Behaviour::Malformed)]);
        orch.run_cycle().await;
        let stored = outputs.get("Agent1_Output").await.unwrap().unwrap();
        assert_eq!(stored.view()["raw_output"], "not json");
    }

    #[tokio::test]
    async fn test_panicking_agent_is_contained() {
        let (orch, outputs) = orchestrator(vec![
            StubAgent::new("Agent1", Behaviour::Panic),
            StubAgent::new("Agent2", Behaviour::Succeed(json!({"ok": true}))),
        ]);

        let report = orch.run_cycle().await;
        assert_eq!(report, CycleReport { succeeded: 1, failed: 1 });
        match outputs.get("Agent1_Output").await.unwrap().unwrap() {
            AgentResult::Failure(f) => {
                assert_eq!(f.kind, FailureKind::Fault);
                assert!(f.error.contains("dataset section missing"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_agent_timeout_aborts_a_hung_attempt() {
        let (orch, outputs) = orchestrator(vec![
            StubAgent::new("Agent1", Behaviour::Hang),
            StubAgent::new("Agent2", Behaviour::Succeed(json!({}))),
        ]);
        let orch = orch.with_agent_timeout(Some(Duration::from_secs(30)));

        let report = orch.run_cycle().await;
        assert_eq!(report.failed, 1);
        match outputs.get("Agent1_Output").await.unwrap().unwrap() {
            AgentResult::Failure(f) => assert_eq!(f.kind, FailureKind::TimedOut),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(outputs.get("Agent2_Output").await.unwrap().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_next_cycle_supersedes_previous_result() {
        let (orch, outputs) =
            orchestrator(vec![StubAgent::new("Agent1", Behaviour::Count(AtomicUsize::new(0)))]);
        orch.run_cycle().await;
        orch.run_cycle().await;
        let stored = outputs.get("Agent1_Output").await.unwrap().unwrap();
        assert_eq!(stored.view(), json!({"round": 2}));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_forever_sleeps_exactly_one_interval_between_cycles() {
        let (orch, outputs) =
            orchestrator(vec![StubAgent::new("Agent1", Behaviour::Count(AtomicUsize::new(0)))]);
        let orch = Arc::new(orch);
        let looping = Arc::clone(&orch);
        let handle = tokio::spawn(async move { looping.run_forever().await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        let first = outputs.get("Agent1_Output").await.unwrap().unwrap();
        assert_eq!(first.view(), json!({"round": 1}));

        tokio::time::sleep(Duration::from_secs(600)).await;
        let second = outputs.get("Agent1_Output").await.unwrap().unwrap();
        assert_eq!(second.view(), json!({"round": 2}));

        handle.abort();
    }
}
