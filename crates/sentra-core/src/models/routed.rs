//! Per-destination delivery records tracked by the alerts router.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alert::{AlertTier, FusedAlert};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
    Acknowledged,
    /// Only produced by the router's explicit `expire_stale` sweep.
    Expired,
}

/// One (alert, destination) delivery attempt record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedAlert {
    pub id: String,
    pub alert_id: String,
    pub destination: String,
    pub tier: AlertTier,
    pub priority: f64,
    pub status: DeliveryStatus,
    pub retry_count: u32,
    pub categories: Vec<String>,
    /// Alert summary payload handed to the delivery handler.
    pub payload: serde_json::Value,
    /// Derived advisory bulletin, synthesized for a configured destination
    /// subset when the categories qualify.
    pub advisory: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
}

impl RoutedAlert {
    pub fn for_destination(alert: &FusedAlert, destination: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            alert_id: alert.id.clone(),
            destination: destination.into(),
            tier: alert.tier,
            priority: alert.priority,
            status: DeliveryStatus::Pending,
            retry_count: 0,
            categories: alert.categories.clone(),
            payload: serde_json::json!({
                "alert_id": alert.id,
                "tier": alert.tier.as_str(),
                "priority": alert.priority,
                "confidence": alert.confidence,
                "categories": alert.categories,
                "entities": alert.entities.iter().map(|e| e.id.clone()).collect::<Vec<_>>(),
                "summary": alert.summary(),
            }),
            advisory: None,
            created_at: Utc::now(),
            delivered_at: None,
            acknowledged_by: None,
        }
    }
}
