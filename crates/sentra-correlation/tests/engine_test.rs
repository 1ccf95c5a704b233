//! Engine-level correlation tests: multi-strategy matching, cache
//! semantics, truncation, and trajectory inference.

use chrono::{Duration, Utc};
use serde_json::json;

use sentra_core::config::CorrelationConfig;
use sentra_core::models::{
    CorrelationType, EntityRef, EntityType, Signal, SignalCategory, SignalSource,
};
use sentra_correlation::{CorrelationEngine, TrajectoryDirection};

fn person(id: &str, name: &str, dob: &str) -> EntityRef {
    EntityRef::new(id, EntityType::Person).with_attributes(json!({"name": name, "dob": dob}))
}

#[test]
fn matching_persons_correlate_on_exact_temporal_and_geographic() {
    let engine = CorrelationEngine::default();
    let now = Utc::now();

    // Two sightings of the same person: identical name+dob, two hours and
    // roughly fifty meters apart.
    let earlier = person("p-1", "Ada Calhoun", "1988-02-14")
        .with_timestamp(now - Duration::hours(2))
        .with_position(51.50000, -0.12000);
    let later = person("p-2", "Ada Calhoun", "1988-02-14")
        .with_timestamp(now)
        .with_position(51.50045, -0.12000);

    engine.add_entity(earlier);
    let result = engine.find_correlations(&later);

    let of_type = |t: CorrelationType| {
        result
            .correlations
            .iter()
            .find(|c| c.correlation_type == t)
            .unwrap_or_else(|| panic!("missing {t:?} correlation"))
    };

    let exact = of_type(CorrelationType::Exact);
    assert_eq!(exact.score, 1.0);

    let temporal = of_type(CorrelationType::Temporal);
    let expected = 1.0 - 2.0 / 24.0;
    assert!((temporal.score - expected).abs() < 1e-6, "temporal {}", temporal.score);

    let geographic = of_type(CorrelationType::Geographic);
    assert!(
        geographic.score > 0.93 && geographic.score < 0.97,
        "geographic {}",
        geographic.score
    );

    // Identical names also clear the fuzzy bar.
    let fuzzy = of_type(CorrelationType::Fuzzy);
    assert_eq!(fuzzy.score, 1.0);
}

#[test]
fn find_correlations_is_cache_idempotent() {
    let engine = CorrelationEngine::default();
    let now = Utc::now();
    engine.add_entity(person("p-1", "Ada Calhoun", "1988-02-14").with_timestamp(now));

    let query = person("p-q", "Ada Calhoun", "1988-02-14").with_timestamp(now);
    let first = engine.find_correlations(&query);
    let second = engine.find_correlations(&query);

    assert_eq!(first.correlations.len(), second.correlations.len());
    for (a, b) in first.correlations.iter().zip(second.correlations.iter()) {
        assert_eq!(a.matched_entity_id, b.matched_entity_id);
        assert_eq!(a.score, b.score);
        assert_eq!(a.correlation_type, b.correlation_type);
    }

    let stats = engine.stats();
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 1);
}

#[test]
fn cached_results_ignore_later_pool_additions_until_invalidated() {
    let engine = CorrelationEngine::default();
    let now = Utc::now();

    let query = person("p-q", "Ada Calhoun", "1988-02-14").with_timestamp(now);
    let empty = engine.find_correlations(&query);
    assert!(empty.correlations.is_empty());

    engine.add_entity(person("p-1", "Ada Calhoun", "1988-02-14").with_timestamp(now));

    // Still the cached (empty) result.
    let cached = engine.find_correlations(&query);
    assert!(cached.correlations.is_empty());

    assert!(engine.invalidate("p-q"));
    let fresh = engine.find_correlations(&query);
    assert!(!fresh.correlations.is_empty());
}

#[test]
fn results_filter_below_min_score_and_truncate() {
    let config = CorrelationConfig {
        max_correlations_per_entity: 3,
        ..CorrelationConfig::default()
    };
    let engine = CorrelationEngine::new(config);
    let now = Utc::now();

    for i in 0..10 {
        engine.add_entity(
            EntityRef::new(format!("p-{i}"), EntityType::Person)
                .with_attributes(json!({"name": format!("Person {i}")}))
                .with_timestamp(now),
        );
    }

    let query = EntityRef::new("p-q", EntityType::Person)
        .with_attributes(json!({"name": "Query Person"}))
        .with_timestamp(now);
    let result = engine.find_correlations(&query);

    // Ten temporal matches at score 1.0 exist; only three survive.
    assert_eq!(result.correlations.len(), 3);
    for c in &result.correlations {
        assert!(c.score >= 0.4);
    }
}

#[test]
fn correlate_registers_candidates_for_future_signals() {
    let engine = CorrelationEngine::default();
    let signal = Signal::new(SignalSource::Anpr, SignalCategory::Sighting, 0.9)
        .with_attributes(json!({"vehicle": {"plate": "AB12 CDE"}}));

    let first = engine.correlate(&signal);
    assert_eq!(first.len(), 1);
    assert!(first[0].result.correlations.is_empty());
    assert_eq!(engine.entity_count(), 1);

    // A second sighting of a similar plate now has something to match.
    let second_signal = Signal::new(SignalSource::Anpr, SignalCategory::Sighting, 0.9)
        .with_attributes(json!({"vehicle": {"plate": "AB12 CDF"}}));
    let second = engine.correlate(&second_signal);
    assert!(!second[0].result.correlations.is_empty());
}

#[test]
fn trajectory_needs_three_temporal_samples() {
    let engine = CorrelationEngine::default();
    let now = Utc::now();

    engine.add_entity(person("p-1", "Ada Calhoun", "1988-02-14")
        .with_timestamp(now - Duration::hours(3)));
    engine.add_entity(person("p-2", "Ada Calhoun", "1988-02-14")
        .with_timestamp(now - Duration::hours(2)));

    let query = person("p-q", "Ada Calhoun", "1988-02-14").with_timestamp(now);
    engine.find_correlations(&query);
    // Only two temporal correlations: no trajectory.
    assert!(engine.infer_threat_trajectory("p-q").is_none());

    engine.add_entity(person("p-3", "Ada Calhoun", "1988-02-14")
        .with_timestamp(now - Duration::hours(1)));
    engine.invalidate("p-q");
    engine.find_correlations(&query);

    let trajectory = engine.infer_threat_trajectory("p-q").expect("trajectory");
    assert_eq!(trajectory.entity_id, "p-q");
    // Later sightings are closer in time, so scores rise across the
    // sequence: escalating, high threat.
    assert_eq!(trajectory.direction, TrajectoryDirection::Escalating);
    assert!(!trajectory.risk_factors.is_empty());
    assert!(!trajectory.recommendations.is_empty());
}

#[test]
fn weapon_trajectory_always_carries_a_weapon_risk_factor() {
    let engine = CorrelationEngine::default();
    let now = Utc::now();

    for i in 1..=3 {
        engine.add_entity(
            EntityRef::new(format!("w-{i}"), EntityType::Weapon)
                .with_attributes(json!({"serial_number": "W-9917"}))
                .with_timestamp(now - Duration::hours(i)),
        );
    }
    let query = EntityRef::new("w-q", EntityType::Weapon)
        .with_attributes(json!({"serial_number": "W-9917"}))
        .with_timestamp(now);
    engine.find_correlations(&query);
    engine.add_entity(query);

    let trajectory = engine.infer_threat_trajectory("w-q").expect("trajectory");
    assert!(trajectory
        .risk_factors
        .iter()
        .any(|f| f.contains("weapon")));
}

#[test]
fn remove_entity_takes_it_out_of_matching() {
    let engine = CorrelationEngine::default();
    let now = Utc::now();
    engine.add_entity(person("p-1", "Ada Calhoun", "1988-02-14").with_timestamp(now));
    assert!(engine.remove_entity("p-1"));
    assert!(!engine.remove_entity("p-1"));

    let query = person("p-q", "Ada Calhoun", "1988-02-14").with_timestamp(now);
    let result = engine.find_correlations(&query);
    assert!(result.correlations.is_empty());
}
