//! The pipeline's unit of work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

/// One item moving through a pipeline's declared stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineItem {
    pub id: String,
    pub payload: serde_json::Value,
    /// Externally supplied key for the merge-buffer variant.
    pub correlation_key: Option<String>,
    pub status: ItemStatus,
    pub stages_completed: Vec<String>,
    pub errors: Vec<String>,
    pub retries: u32,
    pub submitted_at: DateTime<Utc>,
    /// Ids of the source items when this item is a merge product.
    pub merged_from: Vec<String>,
}

impl PipelineItem {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payload,
            correlation_key: None,
            status: ItemStatus::Pending,
            stages_completed: Vec::new(),
            errors: Vec::new(),
            retries: 0,
            submitted_at: Utc::now(),
            merged_from: Vec::new(),
        }
    }

    pub fn with_correlation_key(mut self, key: impl Into<String>) -> Self {
        self.correlation_key = Some(key.into());
        self
    }
}
