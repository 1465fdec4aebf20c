//! Agent2: HR implications of company news.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dataset::{pretty, HrDataset};
use super::prompts::COMPANY_NEWS_PROMPT;
use super::recovery::ExpectedShape;
use super::{check_task_owner, AgentTask, Briefing};
use crate::llm_client::prompts::with_json_only;

const AGENT_NUMBER: u32 = 2;

pub struct CompanyNews;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyNewsDigest {
    #[serde(rename = "Analysis")]
    pub analysis: String,
    #[serde(rename = "Company_news", default)]
    pub company_news: Vec<Value>,
    pub tasks: Vec<AgentTask>,
}

impl ExpectedShape for CompanyNewsDigest {
    fn validate(&self) -> Result<(), String> {
        check_task_owner(&self.tasks, AGENT_NUMBER)
    }

    fn describe(&self) -> Option<String> {
        Some(format!(
            "{} news items, {} tasks",
            self.company_news.len(),
            self.tasks.len()
        ))
    }
}

impl Briefing for CompanyNews {
    const ID: &'static str = "Agent2";
    type Output = CompanyNewsDigest;

    fn render_prompt(dataset: &HrDataset) -> String {
        with_json_only(
            COMPANY_NEWS_PROMPT.replace("{company_news}", &pretty(&dataset.list("company_news"))),
        )
    }
}
