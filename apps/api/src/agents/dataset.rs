//! The local HR dataset the periodic agents analyse.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{json, Value};

use super::AgentError;

/// A loaded HR dataset. Kept as raw JSON: agents embed sections verbatim.
#[derive(Debug, Clone)]
pub struct HrDataset {
    root: Value,
}

impl HrDataset {
    pub async fn load(path: &Path) -> Result<Self, AgentError> {
        let display = path.display().to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AgentError::DatasetIo {
                path: display.clone(),
                source,
            })?;
        let root = serde_json::from_slice(&bytes)
            .map_err(|source| AgentError::DatasetFormat { path: display, source })?;
        Ok(Self { root })
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// A list section such as `employees`; empty when absent.
    pub fn list(&self, key: &str) -> Value {
        match self.root.get(key) {
            Some(v @ Value::Array(_)) => v.clone(),
            _ => json!([]),
        }
    }

    /// An object section such as `performance_reports`; empty when absent.
    pub fn object(&self, key: &str) -> Value {
        match self.root.get(key) {
            Some(v @ Value::Object(_)) => v.clone(),
            _ => json!({}),
        }
    }

    /// Distinct employee departments, sorted.
    pub fn departments(&self) -> Vec<String> {
        self.root
            .get("employees")
            .and_then(|v| v.as_array())
            .map(|employees| {
                employees
                    .iter()
                    .filter_map(|e| e.get("department").and_then(|d| d.as_str()))
                    .map(str::to_string)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Indented JSON for embedding in a prompt.
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
