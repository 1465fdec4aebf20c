//! Assessment agent: question generation and answer evaluation.
//!
//! Invoked inline by HTTP handlers rather than on the orchestration cycle.
//! Same recovery path as the periodic agents; outputs are returned in their
//! normalized typed form so that persisted question types and scores are
//! always well-formed.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::dataset::pretty;
use super::prompts::{ASSESSMENT_EVALUATE_PROMPT, ASSESSMENT_GENERATE_PROMPT};
use super::recovery::{number_or_string, recover_typed, ExpectedShape};
use super::AgentFailure;
use crate::llm_client::prompts::with_json_only;
use crate::llm_client::{LlmError, ModelGateway};

pub const QUESTION_COUNT: usize = 20;
const APTITUDE_COUNT: usize = 10;
pub const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("Model gateway error: {0}")]
    Gateway(#[from] LlmError),

    #[error("{}", .0.error)]
    Output(AgentFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "MCQ", alias = "mcq", alias = "Mcq", alias = "MultipleChoice")]
    Mcq,
    #[serde(alias = "Short Answer", alias = "short_answer", alias = "shortAnswer")]
    ShortAnswer,
    #[serde(
        alias = "Fill in the blank",
        alias = "FillInTheBlank",
        alias = "fill_blank",
        alias = "fillBlank"
    )]
    FillBlank,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub correct_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<AssessmentQuestion>,
}

impl ExpectedShape for QuestionSet {
    fn validate(&self) -> Result<(), String> {
        if self.questions.is_empty() {
            return Err("no questions were generated".to_string());
        }
        for (position, q) in self.questions.iter().enumerate() {
            let expected = position as u32 + 1;
            if q.id != expected {
                return Err(format!(
                    "question ids must run 1..{} in order; found {} at position {expected}",
                    self.questions.len(),
                    q.id
                ));
            }
            if q.question.trim().is_empty() {
                return Err(format!("question {} has no text", q.id));
            }
            if q.kind == QuestionType::Mcq && q.options.len() < 2 {
                return Err(format!("MCQ question {} needs at least two options", q.id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(deserialize_with = "number_or_string")]
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

impl ExpectedShape for Evaluation {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=MAX_SCORE).contains(&self.score) {
            return Err(format!(
                "score {} is outside 0.0..={MAX_SCORE}",
                self.score
            ));
        }
        Ok(())
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected text, found {other}"))),
    }
}

pub fn render_generate_prompt(job_description: &str, applicant_cv: &str) -> String {
    with_json_only(
        ASSESSMENT_GENERATE_PROMPT
            .replace("{question_count}", &QUESTION_COUNT.to_string())
            .replace("{aptitude_count}", &APTITUDE_COUNT.to_string())
            .replace("{domain_count}", &(QUESTION_COUNT - APTITUDE_COUNT).to_string())
            .replace("{job_description}", job_description)
            .replace("{applicant_cv}", applicant_cv),
    )
}

pub fn render_evaluate_prompt(questions_with_answers: &Value, user_responses: &Value) -> String {
    with_json_only(
        ASSESSMENT_EVALUATE_PROMPT
            .replace("{questions_with_answers}", &pretty(questions_with_answers))
            .replace("{user_responses}", &pretty(user_responses)),
    )
}

pub async fn generate_questions(
    gateway: &dyn ModelGateway,
    job_description: &str,
    applicant_cv: &str,
) -> Result<QuestionSet, AssessmentError> {
    let prompt = render_generate_prompt(job_description, applicant_cv);
    let raw = gateway.generate(&prompt).await?;
    let (set, _) = recover_typed::<QuestionSet>(&raw).map_err(AssessmentError::Output)?;
    Ok(set)
}

pub async fn evaluate_responses(
    gateway: &dyn ModelGateway,
    questions_with_answers: &Value,
    user_responses: &Value,
) -> Result<Evaluation, AssessmentError> {
    let prompt = render_evaluate_prompt(questions_with_answers, user_responses);
    let raw = gateway.generate(&prompt).await?;
    let (evaluation, _) = recover_typed::<Evaluation>(&raw).map_err(AssessmentError::Output)?;
    Ok(evaluation)
}
