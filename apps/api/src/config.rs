use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Which halves of the system this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// API server plus the orchestrator on its own thread.
    All,
    /// API server only; agent outputs are read from Redis.
    Api,
    /// Orchestrator only; agent outputs are written to Redis.
    Orchestrator,
}

impl RunMode {
    pub fn serves_api(self) -> bool {
        matches!(self, RunMode::All | RunMode::Api)
    }

    pub fn runs_agents(self) -> bool {
        matches!(self, RunMode::All | RunMode::Orchestrator)
    }
}

impl FromStr for RunMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(RunMode::All),
            "api" => Ok(RunMode::Api),
            "orchestrator" => Ok(RunMode::Orchestrator),
            other => bail!("RUN_MODE must be one of all, api, orchestrator (got '{other}')"),
        }
    }
}

/// Remote repository holding the jobs and chain documents.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub repo: String,
    pub token: String,
    pub branch: String,
    pub jobs_file_path: String,
    pub chain_file_path: String,
}

/// Settings only the API role needs.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub github: GithubConfig,
    pub database_url: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if a variable required by the selected run mode is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub run_mode: RunMode,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub gemini_chat_model: String,
    pub redis_url: Option<String>,
    pub hr_data_path: PathBuf,
    pub orchestration_interval: Duration,
    pub agent_timeout: Option<Duration>,
    /// Present when `run_mode.serves_api()`.
    pub api: Option<ApiConfig>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let run_mode: RunMode = optional_env("RUN_MODE")
            .unwrap_or_else(|| "all".to_string())
            .parse()?;

        let redis_url = optional_env("REDIS_URL");
        if run_mode != RunMode::All && redis_url.is_none() {
            bail!("REDIS_URL is required when RUN_MODE is not 'all'");
        }

        let api = if run_mode.serves_api() {
            Some(ApiConfig {
                github: GithubConfig {
                    api_url: optional_env("GITHUB_API_URL")
                        .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
                    repo: require_env("GITHUB_REPO")?,
                    token: require_env("GITHUB_TOKEN")?,
                    branch: optional_env("GITHUB_BRANCH").unwrap_or_else(|| "main".to_string()),
                    jobs_file_path: require_env("FILE_PATH")?,
                    chain_file_path: require_env("CHAIN_FILE_PATH")?,
                },
                database_url: require_env("DATABASE_URL")?,
                port: parse_env("PORT", 8000)?,
                max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            })
        } else {
            None
        };

        let agent_timeout = match optional_env("AGENT_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(
                raw.parse::<u64>()
                    .context("AGENT_TIMEOUT_SECS must be a whole number of seconds")?,
            )),
            None => None,
        };

        Ok(Config {
            run_mode,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_base_url: optional_env("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            gemini_chat_model: optional_env("GEMINI_CHAT_MODEL")
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            redis_url,
            hr_data_path: optional_env("HR_DATA_PATH")
                .unwrap_or_else(|| "data/hr_mock_data.json".to_string())
                .into(),
            orchestration_interval: Duration::from_secs(parse_env(
                "ORCHESTRATION_INTERVAL_SECS",
                10 * 60,
            )?),
            agent_timeout,
            api,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
