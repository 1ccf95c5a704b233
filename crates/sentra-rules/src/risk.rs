//! Risk profile trend derivation and recommendation templates.

use sentra_core::models::{RiskTrend, ThreatLevel};

/// Samples compared for the trend: first vs last of the most recent three.
pub const TREND_SAMPLE_COUNT: usize = 3;

/// Score movement needed to leave Stable.
const TREND_DELTA: f64 = 1.0;

/// Derive the trend from the historical score list.
pub fn derive_trend(scores: &[(chrono::DateTime<chrono::Utc>, f64)]) -> RiskTrend {
    if scores.len() < TREND_SAMPLE_COUNT {
        return RiskTrend::Stable;
    }
    let window = &scores[scores.len() - TREND_SAMPLE_COUNT..];
    let diff = window[window.len() - 1].1 - window[0].1;
    if diff > TREND_DELTA {
        RiskTrend::Escalating
    } else if diff < -TREND_DELTA {
        RiskTrend::DeEscalating
    } else {
        RiskTrend::Stable
    }
}

/// Templated recommendations per threat level.
pub fn recommendations_for(level: ThreatLevel) -> Vec<String> {
    match level {
        ThreatLevel::Critical => vec![
            "immediate supervisory review".to_string(),
            "notify dispatch and the duty intelligence officer".to_string(),
            "consider protective measures for associated persons".to_string(),
        ],
        ThreatLevel::High => vec![
            "assign to an investigator within the shift".to_string(),
            "flag associated entities for active monitoring".to_string(),
        ],
        ThreatLevel::Medium => vec![
            "queue for investigative review".to_string(),
            "retain correlation history".to_string(),
        ],
        ThreatLevel::Low | ThreatLevel::Minimal => vec![
            "record for intelligence development".to_string(),
        ],
    }
}
