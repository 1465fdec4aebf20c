//! Agent3: turns management notifications into per-department tasks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dataset::{pretty, HrDataset};
use super::prompts::TASK_DISTRIBUTION_PROMPT;
use super::recovery::ExpectedShape;
use super::{check_task_owner, AgentTask, Briefing};
use crate::llm_client::prompts::with_json_only;

const AGENT_NUMBER: u32 = 3;

pub struct TaskDistribution;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPlan {
    #[serde(rename = "Analysis")]
    pub analysis: String,
    #[serde(rename = "Notifications", default)]
    pub notifications: Vec<Value>,
    pub tasks: Vec<AgentTask>,
}

impl ExpectedShape for TaskPlan {
    fn validate(&self) -> Result<(), String> {
        check_task_owner(&self.tasks, AGENT_NUMBER)
    }

    fn describe(&self) -> Option<String> {
        Some(format!(
            "{} notifications, {} tasks",
            self.notifications.len(),
            self.tasks.len()
        ))
    }
}

impl Briefing for TaskDistribution {
    const ID: &'static str = "Agent3";
    type Output = TaskPlan;

    fn render_prompt(dataset: &HrDataset) -> String {
        let departments = Value::from(dataset.departments());
        with_json_only(
            TASK_DISTRIBUTION_PROMPT
                .replace("{notifications}", &pretty(&dataset.list("notifications")))
                .replace("{departments}", &pretty(&departments)),
        )
    }
}
