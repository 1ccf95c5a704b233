//! Correlation-key merge buffer stage.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tracing::debug;

use sentra_core::config::defaults::MERGE_BUFFER_FLUSH_COUNT;

use crate::item::{ItemStatus, PipelineItem};
use crate::stage::{StageAction, StageProcessor};

/// Buffers items by their correlation key; once a key accumulates the flush
/// count they merge into one synthetic item and the buffer entry clears.
///
/// The flush is a pure count threshold with no time-based eviction: a lone
/// item under a key sits in the buffer until a sibling arrives.
/// `pending_keys` exposes stragglers to the host.
pub struct CorrelationMergeProcessor {
    buffer: Mutex<HashMap<String, Vec<PipelineItem>>>,
    flush_count: usize,
}

impl CorrelationMergeProcessor {
    pub fn new() -> Self {
        Self::with_flush_count(MERGE_BUFFER_FLUSH_COUNT)
    }

    pub fn with_flush_count(flush_count: usize) -> Self {
        Self {
            buffer: Mutex::new(HashMap::new()),
            flush_count: flush_count.max(1),
        }
    }

    /// Keys currently holding buffered items.
    pub fn pending_keys(&self) -> Vec<String> {
        self.lock_buffer().keys().cloned().collect()
    }

    fn lock_buffer(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<PipelineItem>>> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for CorrelationMergeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl StageProcessor for CorrelationMergeProcessor {
    fn process(&self, _stage: &str, item: &mut PipelineItem) -> Result<StageAction, String> {
        let Some(key) = item.correlation_key.clone() else {
            // Keyless items pass straight through.
            return Ok(StageAction::Continue);
        };

        let mut buffer = self.lock_buffer();
        let entry = buffer.entry(key.clone()).or_default();
        entry.push(item.clone());

        if entry.len() < self.flush_count {
            debug!(key = %key, buffered = entry.len(), "item buffered for merge");
            return Ok(StageAction::Consume);
        }

        let members = buffer.remove(&key).unwrap_or_default();
        *item = merge_items(&key, members);
        Ok(StageAction::Continue)
    }
}

/// Merge buffered items into one synthetic item: payloads combined key-wise
/// (later items override earlier ones), source ids recorded.
fn merge_items(key: &str, members: Vec<PipelineItem>) -> PipelineItem {
    let mut payload = serde_json::Map::new();
    let mut merged_from = Vec::with_capacity(members.len());
    let mut submitted_at = None;

    for member in &members {
        merged_from.push(member.id.clone());
        if let Value::Object(map) = &member.payload {
            for (k, v) in map {
                payload.insert(k.clone(), v.clone());
            }
        }
        submitted_at = Some(match submitted_at {
            None => member.submitted_at,
            Some(earlier) if member.submitted_at < earlier => member.submitted_at,
            Some(earlier) => earlier,
        });
    }
    payload.insert("merged_count".to_string(), Value::from(members.len()));

    let mut item = PipelineItem::new(Value::Object(payload));
    item.correlation_key = Some(key.to_string());
    item.status = ItemStatus::Processing;
    item.merged_from = merged_from;
    if let Some(at) = submitted_at {
        item.submitted_at = at;
    }
    item
}
