//! Test doubles for the external seams: the model gateway, the remote file
//! store and the application store.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;
use zip::write::FileOptions;

use crate::applications::store::ApplicationStore;
use crate::jobs::chain::ChainStore;
use crate::jobs::file_store::{FileStore, StoreError, VersionedFile};
use crate::jobs::store::JobStore;
use crate::llm_client::{LlmError, ModelGateway};
use crate::models::application::{
    Application, ApplicationStatus, AssessmentUpdate, NewApplication,
};
use crate::orchestrator::outputs::SharedOutputs;
use crate::state::AppState;

pub const JOBS_PATH: &str = "data/jobs.json";
pub const CHAIN_PATH: &str = "data/chain.json";

/// Replays canned replies in order, repeating the last one, and records
/// every prompt it receives.
pub struct ScriptedGateway {
    replies: Vec<Result<String, String>>,
    cursor: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn always(reply: &str) -> Self {
        Self::sequence(&[reply])
    }

    pub fn sequence(replies: &[&str]) -> Self {
        Self::scripted(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Every call fails with an upstream error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self::scripted(vec![Err(message.to_string())])
    }

    fn scripted(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies,
            cursor: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let index = self
            .cursor
            .fetch_add(1, Ordering::SeqCst)
            .min(self.replies.len() - 1);
        match &self.replies[index] {
            Ok(reply) => Ok(reply.clone()),
            Err(message) => Err(LlmError::Api {
                status: 503,
                message: message.clone(),
            }),
        }
    }
}

/// A well-formed question set of `count` questions, first one an MCQ.
pub fn question_set_reply(count: u32) -> String {
    let questions: Vec<Value> = (1..=count)
        .map(|id| match id % 3 {
            1 => json!({
                "id": id,
                "type": "MCQ",
                "question": format!("Question {id}?"),
                "options": ["A", "B", "C", "D"],
                "correct_answer": "B"
            }),
            2 => json!({
                "id": id,
                "type": "ShortAnswer",
                "question": format!("Explain concept {id}."),
                "correct_answer": "Ownership"
            }),
            _ => json!({
                "id": id,
                "type": "FillBlank",
                "question": format!("Rust's package manager is ____ ({id})."),
                "correct_answer": "cargo"
            }),
        })
        .collect();
    json!({ "questions": questions }).to_string()
}

/// A `.docx` archive whose body part is `document_xml`.
pub fn docx_fixture(document_xml: &str) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        writer
            .start_file("[Content_Types].xml", FileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer
            .start_file("word/document.xml", FileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
    buffer.into_inner()
}

/// A one-page PDF showing `text` in Helvetica, with a correct xref table.
pub fn pdf_fixture(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 18 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", index + 1).as_bytes());
    }
    let xref = pdf.len();
    let size = objects.len() + 1;
    pdf.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!("trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n").as_bytes(),
    );
    pdf
}

struct StoredFile {
    content: String,
    version: usize,
}

/// In-memory versioned file store with the same optimistic-token rules as
/// the real one: a commit against a stale sha is a `Conflict`.
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, StoredFile>>,
    commits: Mutex<Vec<(String, String)>>,
    versions: AtomicUsize,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &str, content: &str) {
        let version = self.versions.fetch_add(1, Ordering::SeqCst);
        self.files.lock().unwrap().insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                version,
            },
        );
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|f| f.content.clone())
    }

    /// Commit messages recorded for `path`, oldest first.
    pub fn commits(&self, path: &str) -> Vec<String> {
        self.commits
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

fn sha(version: usize) -> String {
    format!("sha-{version}")
}

fn missing(path: &str) -> StoreError {
    StoreError::Upstream {
        status: 404,
        path: path.to_string(),
        message: "Not Found".to_string(),
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn fetch(&self, path: &str) -> Result<VersionedFile, StoreError> {
        let files = self.files.lock().unwrap();
        let file = files.get(path).ok_or_else(|| missing(path))?;
        Ok(VersionedFile {
            content: file.content.clone(),
            sha: sha(file.version),
        })
    }

    async fn commit(
        &self,
        path: &str,
        content: &str,
        expected_sha: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        let mut files = self.files.lock().unwrap();
        let file = files.get_mut(path).ok_or_else(|| missing(path))?;
        if sha(file.version) != expected_sha {
            return Err(StoreError::Conflict {
                path: path.to_string(),
            });
        }
        file.content = content.to_string();
        file.version = self.versions.fetch_add(1, Ordering::SeqCst);
        self.commits
            .lock()
            .unwrap()
            .push((path.to_string(), message.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryApplicationStore {
    applications: Mutex<Vec<Application>>,
}

impl MemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn create(&self, application: NewApplication) -> Result<Uuid, sqlx::Error> {
        let id = Uuid::new_v4();
        self.applications
            .lock()
            .unwrap()
            .push(application.into_application(id, Utc::now()));
        Ok(id)
    }

    async fn list_by_job(&self, job_id: &str) -> Result<Vec<Application>, sqlx::Error> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Application>, sqlx::Error> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn save_assessment(&self, id: Uuid, update: AssessmentUpdate) -> Result<bool, sqlx::Error> {
        let mut applications = self.applications.lock().unwrap();
        let Some(app) = applications.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        app.assessment_questions = Some(update.questions);
        if update.answers.is_some() {
            app.assessment_answers = update.answers;
        }
        if update.result.is_some() {
            app.assessment_result = update.result;
        }
        Ok(true)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, sqlx::Error> {
        let mut applications = self.applications.lock().unwrap();
        Ok(applications.iter_mut().find(|a| a.id == id).map(|app| {
            app.status = status;
            app.clone()
        }))
    }
}

/// Handles onto the doubles behind a test `AppState`.
pub struct TestApp {
    pub state: AppState,
    pub files: Arc<MemoryFileStore>,
    pub outputs: SharedOutputs,
    pub applications: Arc<MemoryApplicationStore>,
}

/// State over in-memory doubles. Jobs and chain documents start empty.
pub fn test_app(model: Arc<dyn ModelGateway>, chat: Arc<dyn ModelGateway>) -> TestApp {
    let files = Arc::new(MemoryFileStore::new());
    files.put(JOBS_PATH, r#"{"jobs": []}"#);
    files.put(CHAIN_PATH, r#"{"chain": []}"#);
    let outputs = SharedOutputs::new();
    let applications = Arc::new(MemoryApplicationStore::new());

    let state = AppState {
        outputs: Arc::new(outputs.clone()),
        jobs: JobStore::new(files.clone(), JOBS_PATH),
        chain: ChainStore::new(files.clone(), CHAIN_PATH),
        applications: applications.clone(),
        model,
        chat,
        max_upload_bytes: 1024 * 1024,
    };

    TestApp {
        state,
        files,
        outputs,
        applications,
    }
}
