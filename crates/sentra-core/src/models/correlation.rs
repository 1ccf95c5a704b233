//! Correlations between a query entity and pool entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationType {
    Exact,
    Fuzzy,
    Temporal,
    Geographic,
}

/// Discrete strength bucket derived from a continuous match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Tentative,
    Weak,
    Moderate,
    Strong,
    Definite,
}

impl CorrelationStrength {
    /// Bucket thresholds: ≥.95 Definite, ≥.80 Strong, ≥.60 Moderate,
    /// ≥.40 Weak, else Tentative.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            CorrelationStrength::Definite
        } else if score >= 0.80 {
            CorrelationStrength::Strong
        } else if score >= 0.60 {
            CorrelationStrength::Moderate
        } else if score >= 0.40 {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::Tentative
        }
    }
}

/// A single scored match between the query entity and one pool entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correlation {
    pub entity_id: String,
    pub matched_entity_id: String,
    pub correlation_type: CorrelationType,
    /// Match score in [0, 1] per the strategy's formula.
    pub score: f64,
    pub strength: CorrelationStrength,
    /// Timestamp of the matched pool entity; used by trajectory inference.
    pub matched_at: DateTime<Utc>,
}

impl Correlation {
    pub fn new(
        entity_id: impl Into<String>,
        matched_entity_id: impl Into<String>,
        correlation_type: CorrelationType,
        score: f64,
        matched_at: DateTime<Utc>,
    ) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            entity_id: entity_id.into(),
            matched_entity_id: matched_entity_id.into(),
            correlation_type,
            score,
            strength: CorrelationStrength::from_score(score),
            matched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_buckets_match_thresholds() {
        assert_eq!(CorrelationStrength::from_score(0.95), CorrelationStrength::Definite);
        assert_eq!(CorrelationStrength::from_score(0.94), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::from_score(0.80), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::from_score(0.79), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_score(0.60), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_score(0.59), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::from_score(0.40), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::from_score(0.39), CorrelationStrength::Tentative);
    }

    #[test]
    fn scores_are_clamped_to_unit_interval() {
        let c = Correlation::new("a", "b", CorrelationType::Exact, 1.4, Utc::now());
        assert_eq!(c.score, 1.0);
        assert_eq!(c.strength, CorrelationStrength::Definite);
    }
}
