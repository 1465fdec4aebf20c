use std::sync::Arc;

use serde_json::{Map, Value};

use super::file_store::{FileStore, StoreError};
use crate::models::chain::{Block, ChainDocument};

/// Append-only block document. Block numbers equal the chain length at
/// the time of the append.
#[derive(Clone)]
pub struct ChainStore {
    files: Arc<dyn FileStore>,
    path: String,
}

impl ChainStore {
    pub fn new(files: Arc<dyn FileStore>, path: impl Into<String>) -> Self {
        Self {
            files,
            path: path.into(),
        }
    }

    /// The document as stored, whatever its structure.
    pub async fn get(&self) -> Result<Value, StoreError> {
        let file = self.files.fetch(&self.path).await?;
        serde_json::from_str(&file.content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub async fn append(&self, data: Map<String, Value>) -> Result<Block, StoreError> {
        let file = self.files.fetch(&self.path).await?;
        let value: Value = serde_json::from_str(&file.content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        if !value.get("chain").is_some_and(Value::is_array) {
            return Err(StoreError::InvalidDocument {
                path: self.path.clone(),
                detail: "expected a top-level \"chain\" list".to_string(),
            });
        }
        let mut doc: ChainDocument =
            serde_json::from_value(value).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let block = Block {
            block_no: doc.chain.len() as u64,
            data: Value::Object(data),
        };
        let entry = serde_json::to_value(&block).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        doc.chain.push(entry);

        let content = serde_json::to_string_pretty(&doc).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let message = format!("Added block #{}", block.block_no);
        self.files
            .commit(&self.path, &content, &file.sha, &message)
            .await?;
        Ok(block)
    }
}
