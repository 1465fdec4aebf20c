use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_no: u64,
    pub data: Value,
}

/// `{ "chain": [...] }`, append-only. Existing blocks are carried verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainDocument {
    pub chain: Vec<Value>,
}
