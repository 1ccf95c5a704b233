//! Priority scores and per-entity risk profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Threat level buckets: ≥85 Critical, ≥70 High, ≥50 Medium, ≥30 Low,
/// else Minimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            ThreatLevel::Critical
        } else if score >= 70.0 {
            ThreatLevel::High
        } else if score >= 50.0 {
            ThreatLevel::Medium
        } else if score >= 30.0 {
            ThreatLevel::Low
        } else {
            ThreatLevel::Minimal
        }
    }
}

/// Attribution for one fired rule or custom evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleAttribution {
    pub rule_id: String,
    pub label: String,
    pub contribution: f64,
}

/// The rules engine's output for one signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityScore {
    /// Final score, clamped to the engine's [min_score, max_score].
    pub score: f64,
    pub threat_level: ThreatLevel,
    pub fired: Vec<RuleAttribution>,
    /// Saturating heuristic: min(1, rules_fired / 5).
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTrend {
    Escalating,
    DeEscalating,
    Stable,
}

/// Per-entity risk profile maintained by `assess_threat`.
///
/// The historical score list grows without bound for the life of the
/// process; trend derives from a 3-sample first-vs-last comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    pub entity_id: String,
    pub historical_scores: Vec<(DateTime<Utc>, f64)>,
    pub trend: RiskTrend,
    pub threat_level: ThreatLevel,
    pub recommendations: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_level_thresholds() {
        assert_eq!(ThreatLevel::from_score(85.0), ThreatLevel::Critical);
        assert_eq!(ThreatLevel::from_score(84.9), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(70.0), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(50.0), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(30.0), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(29.9), ThreatLevel::Minimal);
    }
}
