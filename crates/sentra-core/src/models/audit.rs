//! Outbound collaborator payloads: audit entries, sync results, broadcast
//! frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alert::{AlertTier, FusedAlert};

/// One append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub action: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action: action.into(),
            details,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of syncing one alert facet into the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    pub target: String,
    pub success: bool,
    pub detail: Option<String>,
}

/// The frame pushed to broadcast subscribers for each fused alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastFrame {
    pub alert_id: String,
    pub tier: AlertTier,
    pub priority: f64,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl BroadcastFrame {
    pub fn from_alert(alert: &FusedAlert) -> Self {
        Self {
            alert_id: alert.id.clone(),
            tier: alert.tier,
            priority: alert.priority,
            summary: alert.summary(),
            timestamp: Utc::now(),
        }
    }
}
