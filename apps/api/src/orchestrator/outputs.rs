//! The shared output map: latest `AgentResult` per agent, one writer,
//! many readers.
//!
//! `SharedOutputs` keeps the map in process memory for `RUN_MODE=all`.
//! `RedisOutputs` keeps it in one Redis hash so the API and the
//! orchestrator can run as separate processes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::agents::AgentResult;

/// Redis hash holding every agent's latest result.
pub const REDIS_OUTPUTS_KEY: &str = "orbit:agent_outputs";

#[derive(Debug, Error)]
pub enum OutputStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to encode result for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored result for {key} is unreadable: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Whole-value writes keyed by output key. Readers observe either the
/// previous value or the new one.
#[async_trait]
pub trait OutputStore: Send + Sync {
    async fn publish(&self, key: &str, result: AgentResult) -> Result<(), OutputStoreError>;

    async fn get(&self, key: &str) -> Result<Option<AgentResult>, OutputStoreError>;

    /// Every stored result, ordered by key.
    async fn snapshot(&self) -> Result<BTreeMap<String, AgentResult>, OutputStoreError>;
}

/// In-process map behind a read-write lock.
#[derive(Clone, Default)]
pub struct SharedOutputs {
    inner: Arc<RwLock<HashMap<String, AgentResult>>>,
}

impl SharedOutputs {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OutputStore for SharedOutputs {
    async fn publish(&self, key: &str, result: AgentResult) -> Result<(), OutputStoreError> {
        self.inner.write().await.insert(key.to_string(), result);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<AgentResult>, OutputStoreError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn snapshot(&self) -> Result<BTreeMap<String, AgentResult>, OutputStoreError> {
        let map = self.inner.read().await;
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Out-of-process map: one Redis hash, field = output key, value = the
/// tagged JSON form of the result. `HSET` replaces a field atomically.
#[derive(Clone)]
pub struct RedisOutputs {
    client: redis::Client,
}

impl RedisOutputs {
    pub fn new(redis_url: &str) -> Result<Self, OutputStoreError> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, OutputStoreError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

fn decode(key: &str, raw: &str) -> Result<AgentResult, OutputStoreError> {
    serde_json::from_str(raw).map_err(|source| OutputStoreError::Decode {
        key: key.to_string(),
        source,
    })
}

#[async_trait]
impl OutputStore for RedisOutputs {
    async fn publish(&self, key: &str, result: AgentResult) -> Result<(), OutputStoreError> {
        let encoded = serde_json::to_string(&result).map_err(|source| OutputStoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        let mut conn = self.connection().await?;
        conn.hset::<_, _, _, ()>(REDIS_OUTPUTS_KEY, key, encoded)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<AgentResult>, OutputStoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.hget(REDIS_OUTPUTS_KEY, key).await?;
        raw.map(|r| decode(key, &r)).transpose()
    }

    async fn snapshot(&self) -> Result<BTreeMap<String, AgentResult>, OutputStoreError> {
        let mut conn = self.connection().await?;
        let raw: HashMap<String, String> = conn.hgetall(REDIS_OUTPUTS_KEY).await?;
        raw.into_iter()
            .map(|(key, value)| decode(&key, &value).map(|result| (key, result)))
            .collect()
    }
}
