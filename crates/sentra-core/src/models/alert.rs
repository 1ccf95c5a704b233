//! Fused alerts — the correlated, scored, tiered output unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::correlation::Correlation;
use super::entity::EntityRef;

/// Urgency bucket driving the routing destination set. T1 is highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTier {
    T1,
    T2,
    T3,
    T4,
}

impl AlertTier {
    /// Score-derived tier: ≥80 T1, ≥60 T2, ≥40 T3, else T4.
    pub fn from_priority(score: f64) -> Self {
        if score >= 80.0 {
            AlertTier::T1
        } else if score >= 60.0 {
            AlertTier::T2
        } else if score >= 40.0 {
            AlertTier::T3
        } else {
            AlertTier::T4
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertTier::T1 => "t1",
            AlertTier::T2 => "t2",
            AlertTier::T3 => "t3",
            AlertTier::T4 => "t4",
        }
    }
}

/// The fusion output: built from exactly one signal plus its correlation
/// result, handed to the router, then discarded. Core keeps no alert store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedAlert {
    pub id: String,
    pub tier: AlertTier,
    /// Priority in [0, 100] from the rules engine.
    pub priority: f64,
    /// Category slugs: the signal category plus the types of every extracted
    /// entity ("person", "vehicle", ...).
    pub categories: Vec<String>,
    pub source_signal_ids: Vec<String>,
    pub entities: Vec<EntityRef>,
    pub correlations: Vec<Correlation>,
    /// Explicit destinations stamped by the orchestrator (tier table plus
    /// source-specific additions). The router unions these with its own
    /// tables.
    pub routing_destinations: Vec<String>,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl FusedAlert {
    pub fn summary(&self) -> String {
        format!(
            "{} alert, priority {:.0}, {} correlation(s), categories [{}]",
            self.tier.as_str(),
            self.priority,
            self.correlations.len(),
            self.categories.join(", "),
        )
    }
}
