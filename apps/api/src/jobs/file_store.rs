//! Remote version-controlled file store backing the jobs and chain documents.
//!
//! Every write supplies the version token (content sha) read just before it.
//! A stale token fails the write; nothing here retries.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::GithubConfig;

const USER_AGENT: &str = concat!("orbit-api/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("File store returned {status} for {path}: {message}")]
    Upstream {
        status: u16,
        path: String,
        message: String,
    },

    #[error("Content of {path} could not be decoded: {detail}")]
    Decode { path: String, detail: String },

    #[error("{path} changed since it was read; reload and try again")]
    Conflict { path: String },

    #[error("Failed to parse {path} content: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {path} structure: {detail}")]
    InvalidDocument { path: String, detail: String },
}

/// File content together with the version token needed to overwrite it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedFile {
    pub content: String,
    pub sha: String,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<VersionedFile, StoreError>;

    /// Replaces the whole file. Fails with `Conflict` when `sha` is stale.
    async fn commit(
        &self,
        path: &str,
        content: &str,
        sha: &str,
        message: &str,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct GithubError {
    message: String,
}

/// GitHub contents API client bound to one repository and branch.
#[derive(Clone)]
pub struct GithubFileStore {
    client: Client,
    api_url: String,
    repo: String,
    token: String,
    branch: String,
}

impl GithubFileStore {
    pub fn new(config: &GithubConfig) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repo: config.repo.clone(),
            token: config.token.clone(),
            branch: config.branch.clone(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_url,
            self.repo,
            path.trim_start_matches('/')
        )
    }
}

async fn upstream_error(response: reqwest::Response, path: &str) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GithubError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    StoreError::Upstream {
        status,
        path: path.to_string(),
        message,
    }
}

/// Decodes the contents API payload: base64 wrapped at 60 columns.
pub fn decode_content(path: &str, encoded: &str) -> Result<String, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact).map_err(|e| StoreError::Decode {
        path: path.to_string(),
        detail: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode {
        path: path.to_string(),
        detail: e.to_string(),
    })
}

#[async_trait]
impl FileStore for GithubFileStore {
    async fn fetch(&self, path: &str) -> Result<VersionedFile, StoreError> {
        let response = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", self.branch.as_str())])
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response, path).await);
        }

        let body: ContentsResponse = response.json().await?;
        debug!("Fetched {path} at {}", body.sha);
        Ok(VersionedFile {
            content: decode_content(path, &body.content)?,
            sha: body.sha,
        })
    }

    async fn commit(
        &self,
        path: &str,
        content: &str,
        sha: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        let request = CommitRequest {
            message,
            content: BASE64.encode(content.as_bytes()),
            sha,
            branch: &self.branch,
        };

        let response = self
            .client
            .put(self.contents_url(path))
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .json(&request)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                info!("Committed {path}: {message}");
                Ok(())
            }
            StatusCode::CONFLICT => Err(StoreError::Conflict {
                path: path.to_string(),
            }),
            _ => Err(upstream_error(response, path).await),
        }
    }
}
