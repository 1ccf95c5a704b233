//! Threat trajectory inference from repeated temporal correlations.

use serde::{Deserialize, Serialize};

use sentra_core::models::{Correlation, EntityType, ThreatLevel};

/// Minimum temporal correlations before a trajectory can be inferred.
pub const MIN_TEMPORAL_SAMPLES: usize = 3;

/// Score movement needed between first and last sample to leave Stable.
const DIRECTION_DELTA: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryDirection {
    Escalating,
    DeEscalating,
    Stable,
}

/// An inferred trajectory for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatTrajectory {
    pub entity_id: String,
    pub direction: TrajectoryDirection,
    pub threat_level: ThreatLevel,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Build a trajectory from the entity's temporal correlations, already
/// sorted by matched time ascending. Caller guarantees
/// `temporal.len() >= MIN_TEMPORAL_SAMPLES`.
pub(crate) fn build(
    entity_id: &str,
    entity_type: EntityType,
    temporal: &[Correlation],
    window_hours: f64,
) -> ThreatTrajectory {
    let first = temporal[0].score;
    let last = temporal[temporal.len() - 1].score;

    let direction = if last > first + DIRECTION_DELTA {
        TrajectoryDirection::Escalating
    } else if last < first - DIRECTION_DELTA {
        TrajectoryDirection::DeEscalating
    } else {
        TrajectoryDirection::Stable
    };

    let threat_level = match direction {
        TrajectoryDirection::Escalating => ThreatLevel::High,
        _ => ThreatLevel::Medium,
    };

    let mut risk_factors = vec![format!(
        "{} temporal associations within a {window_hours:.0}h window",
        temporal.len()
    )];
    if entity_type == EntityType::Weapon {
        risk_factors.push("weapon involvement across correlated events".to_string());
    }
    if direction == TrajectoryDirection::Escalating {
        risk_factors.push("association scores rising across the sequence".to_string());
    }

    let recommendations = match direction {
        TrajectoryDirection::Escalating => vec![
            "escalate to the intelligence desk for active monitoring".to_string(),
            "brief patrol units covering the associated locations".to_string(),
        ],
        TrajectoryDirection::DeEscalating => vec![
            "downgrade monitoring cadence; retain correlation history".to_string(),
        ],
        TrajectoryDirection::Stable => vec![
            "maintain current monitoring cadence".to_string(),
        ],
    };

    ThreatTrajectory {
        entity_id: entity_id.to_string(),
        direction,
        threat_level,
        risk_factors,
        recommendations,
    }
}
