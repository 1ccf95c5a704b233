//! Seams to external collaborators.
//!
//! All outbound calls are fire-and-forget from the orchestrator's point of
//! view: failures are logged, never propagated back into signal intake.
//! Defaults are concrete no-op implementations, not null checks.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::DeliveryError;
use crate::models::{AuditEntry, FusedAlert, RoutedAlert, Signal, SyncResult};
use crate::value;

/// Persists fused intelligence into the knowledge graph.
#[async_trait]
pub trait KnowledgeGraphSync: Send + Sync {
    async fn sync_intelligence(&self, alert: &FusedAlert) -> Vec<SyncResult>;
}

/// Append-only action log.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn log_action(&self, action: &str, details: serde_json::Value) -> AuditEntry;
}

/// Source-specific signal normalization hook, run before enrichment.
pub trait SignalNormalizer: Send + Sync {
    fn normalize(&self, signal: &mut Signal);
}

/// Destination delivery. Implementations raise `DeliveryError` to engage the
/// router's bounded retry logic.
#[async_trait]
pub trait DeliveryHandler: Send + Sync {
    async fn deliver(&self, alert: &RoutedAlert) -> Result<(), DeliveryError>;
}

/// Knowledge-graph sink that accepts everything and stores nothing.
#[derive(Debug, Default)]
pub struct NoopKnowledgeGraph;

#[async_trait]
impl KnowledgeGraphSync for NoopKnowledgeGraph {
    async fn sync_intelligence(&self, alert: &FusedAlert) -> Vec<SyncResult> {
        alert
            .entities
            .iter()
            .map(|entity| SyncResult {
                target: entity.id.clone(),
                success: true,
                detail: None,
            })
            .collect()
    }
}

/// In-memory audit log for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn log_action(&self, action: &str, details: serde_json::Value) -> AuditEntry {
        let entry = AuditEntry::new(action, details);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
        entry
    }
}

/// The default normalizer: stamps `metadata.normalized_at` and nothing else.
#[derive(Debug, Default)]
pub struct StampNormalizer;

impl SignalNormalizer for StampNormalizer {
    fn normalize(&self, signal: &mut Signal) {
        value::stamp(
            &mut signal.metadata,
            "normalized_at",
            serde_json::json!(chrono::Utc::now().to_rfc3339()),
        );
    }
}
