//! Per-signal processing steps: enrichment, the fusion gate, alert
//! assembly.

use chrono::Utc;
use serde_json::json;

use sentra_core::config::OrchestratorConfig;
use sentra_core::models::{
    AlertTier, FusedAlert, PriorityScore, Signal, SignalSource,
};
use sentra_core::value;
use sentra_correlation::EntityCorrelations;

/// Multiply confidence by the static per-source reliability table and stamp
/// the factor into metadata.
pub fn enrich(signal: &mut Signal, config: &OrchestratorConfig) {
    let reliability = config
        .source_reliability
        .get(&signal.source)
        .copied()
        .unwrap_or(config.default_source_reliability);
    signal.confidence = (signal.confidence * reliability).clamp(0.0, 1.0);
    value::stamp(&mut signal.metadata, "reliability", json!(reliability));
    value::stamp(&mut signal.metadata, "enriched_at", json!(Utc::now().to_rfc3339()));
}

/// The fusion gate: any-of, favoring recall. Downstream stages filter
/// further.
pub fn fusion_eligible(
    config: &OrchestratorConfig,
    max_correlation: f64,
    priority: f64,
    confidence: f64,
) -> bool {
    max_correlation >= config.correlation_threshold
        || priority >= config.priority_threshold
        || confidence >= config.high_confidence_threshold
}

/// The designated safety source forces T1 regardless of score.
pub fn assign_tier(source: SignalSource, priority: f64) -> AlertTier {
    if source == SignalSource::OfficerSafety {
        AlertTier::T1
    } else {
        AlertTier::from_priority(priority)
    }
}

/// Tier-keyed destinations plus source-specific additions, order-preserving
/// dedup.
pub fn routing_destinations(
    config: &OrchestratorConfig,
    tier: AlertTier,
    source: SignalSource,
) -> Vec<String> {
    let mut destinations = Vec::new();
    if let Some(tier_dests) = config.tier_destinations.get(&tier) {
        for dest in tier_dests {
            if !destinations.contains(dest) {
                destinations.push(dest.clone());
            }
        }
    }
    if let Some(source_dests) = config.source_destinations.get(&source) {
        for dest in source_dests {
            if !destinations.contains(dest) {
                destinations.push(dest.clone());
            }
        }
    }
    destinations
}

/// Assemble the fused alert from one signal and its correlation result.
pub fn build_alert(
    config: &OrchestratorConfig,
    signal: &Signal,
    entity_results: &[EntityCorrelations],
    priority: &PriorityScore,
) -> FusedAlert {
    let tier = assign_tier(signal.source, priority.score);

    let mut categories = vec![signal.category.as_str().to_string()];
    for result in entity_results {
        let slug = result.entity.entity_type.as_str().to_string();
        if !categories.contains(&slug) {
            categories.push(slug);
        }
    }

    FusedAlert {
        id: uuid::Uuid::new_v4().to_string(),
        tier,
        priority: priority.score,
        categories,
        source_signal_ids: vec![signal.id.clone()],
        entities: entity_results.iter().map(|r| r.entity.clone()).collect(),
        correlations: entity_results
            .iter()
            .flat_map(|r| r.result.correlations.iter().cloned())
            .collect(),
        routing_destinations: routing_destinations(config, tier, signal.source),
        confidence: signal.confidence,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentra_core::config::defaults::DEST_OFFICER_SAFETY;
    use sentra_core::models::SignalCategory;

    #[test]
    fn enrichment_multiplies_by_source_reliability() {
        let config = OrchestratorConfig::default();
        let mut signal = Signal::new(SignalSource::TipLine, SignalCategory::Tip, 1.0);
        enrich(&mut signal, &config);
        assert!((signal.confidence - 0.60).abs() < 1e-9);
        assert_eq!(signal.metadata["reliability"], 0.60);
    }

    #[test]
    fn unknown_reliability_defaults() {
        let mut config = OrchestratorConfig::default();
        config.source_reliability.clear();
        let mut signal = Signal::new(SignalSource::Osint, SignalCategory::Tip, 1.0);
        enrich(&mut signal, &config);
        assert!((signal.confidence - 0.80).abs() < 1e-9);
    }

    #[test]
    fn gate_is_any_of() {
        let config = OrchestratorConfig::default();
        assert!(fusion_eligible(&config, 0.6, 0.0, 0.0));
        assert!(fusion_eligible(&config, 0.0, 30.0, 0.0));
        assert!(fusion_eligible(&config, 0.0, 0.0, 0.9));
        assert!(!fusion_eligible(&config, 0.59, 29.9, 0.89));
    }

    #[test]
    fn safety_source_forces_t1() {
        assert_eq!(assign_tier(SignalSource::OfficerSafety, 5.0), AlertTier::T1);
        assert_eq!(assign_tier(SignalSource::Osint, 5.0), AlertTier::T4);
        assert_eq!(assign_tier(SignalSource::Osint, 85.0), AlertTier::T1);
    }

    #[test]
    fn destinations_union_tier_and_source_tables() {
        let config = OrchestratorConfig::default();
        let dests = routing_destinations(&config, AlertTier::T1, SignalSource::OfficerSafety);
        assert!(dests.contains(&DEST_OFFICER_SAFETY.to_string()));
        assert!(dests.contains(&"patrol_bulletin".to_string()));
    }
}
