//! Agent1: staffing, hiring and attrition trends over the whole dataset.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dataset::{pretty, HrDataset};
use super::prompts::HR_ANALYTICS_PROMPT;
use super::recovery::ExpectedShape;
use super::{check_task_owner, AgentTask, Briefing};
use crate::llm_client::prompts::with_json_only;

const AGENT_NUMBER: u32 = 1;

pub struct HrAnalytics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrAnalyticsReport {
    #[serde(rename = "Analysis")]
    pub analysis: String,
    // Counts come back as numbers or prose ("12 this quarter").
    #[serde(rename = "Recruits")]
    pub recruits: Value,
    #[serde(rename = "Resigned")]
    pub resigned: Value,
    #[serde(rename = "Fired")]
    pub fired: Value,
    pub tasks: Vec<AgentTask>,
}

impl ExpectedShape for HrAnalyticsReport {
    fn validate(&self) -> Result<(), String> {
        check_task_owner(&self.tasks, AGENT_NUMBER)
    }

    fn describe(&self) -> Option<String> {
        Some(format!(
            "recruits {}, resigned {}, fired {}, {} tasks",
            self.recruits,
            self.resigned,
            self.fired,
            self.tasks.len()
        ))
    }
}

impl Briefing for HrAnalytics {
    const ID: &'static str = "Agent1";
    type Output = HrAnalyticsReport;

    fn render_prompt(dataset: &HrDataset) -> String {
        with_json_only(HR_ANALYTICS_PROMPT.replace("{hr_data}", &pretty(dataset.as_value())))
    }
}
