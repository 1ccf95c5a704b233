//! Cluster pattern detection over an entity's filtered correlations.

use serde::{Deserialize, Serialize};

use sentra_core::models::{Correlation, CorrelationType};

/// Minimum same-type members before a cluster forms.
const CLUSTER_MIN_MEMBERS: usize = 3;

/// A detected cluster across one entity's correlations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationPattern {
    pub pattern_type: String,
    /// Mean score of the member correlations.
    pub score: f64,
    pub member_ids: Vec<String>,
}

/// Detect temporal and geographic clusters.
///
/// Requires at least two filtered correlations to run at all; each cluster
/// requires ≥3 members of its type. Exact and fuzzy correlations never
/// cluster.
pub fn detect_patterns(correlations: &[Correlation]) -> Vec<CorrelationPattern> {
    if correlations.len() < 2 {
        return Vec::new();
    }

    let mut patterns = Vec::new();
    for (correlation_type, pattern_type) in [
        (CorrelationType::Temporal, "temporal_cluster"),
        (CorrelationType::Geographic, "geographic_cluster"),
    ] {
        let members: Vec<&Correlation> = correlations
            .iter()
            .filter(|c| c.correlation_type == correlation_type)
            .collect();
        if members.len() < CLUSTER_MIN_MEMBERS {
            continue;
        }
        let score = members.iter().map(|c| c.score).sum::<f64>() / members.len() as f64;
        patterns.push(CorrelationPattern {
            pattern_type: pattern_type.to_string(),
            score,
            member_ids: members.iter().map(|c| c.matched_entity_id.clone()).collect(),
        });
    }
    patterns
}
