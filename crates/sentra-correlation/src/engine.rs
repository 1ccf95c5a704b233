//! The correlation engine: entity pool, strategy dispatch, result cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use sentra_core::config::CorrelationConfig;
use sentra_core::models::{Correlation, CorrelationType, EntityRef, EntityType, Signal};

use crate::extract;
use crate::patterns::{self, CorrelationPattern};
use crate::strategies;
use crate::trajectory::{self, ThreatTrajectory, MIN_TEMPORAL_SAMPLES};

/// The outcome of correlating one query entity against the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub entity_id: String,
    pub correlations: Vec<Correlation>,
    pub patterns: Vec<CorrelationPattern>,
}

/// Per-candidate output of [`CorrelationEngine::correlate`].
#[derive(Debug, Clone)]
pub struct EntityCorrelations {
    pub entity: EntityRef,
    pub result: CorrelationResult,
}

/// Counters snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationStats {
    pub entities: usize,
    pub cached_results: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub correlations_computed: u64,
}

struct EngineState {
    entities: HashMap<String, EntityRef>,
    by_type: HashMap<EntityType, Vec<String>>,
    /// Results cached per query-entity id, unconditionally, with no TTL.
    /// `add_entity`/`remove_entity` do not invalidate; hosts that need
    /// freshness call `invalidate`.
    result_cache: HashMap<String, CorrelationResult>,
}

/// Matches one entity against the cached entity pool using four independent
/// strategies and detects clusters over the filtered result.
///
/// One mutex guards each add/remove/find sequence, so the engine is safe
/// under preemptive threads.
pub struct CorrelationEngine {
    config: CorrelationConfig,
    state: Mutex<EngineState>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    correlations_computed: AtomicU64,
}

impl CorrelationEngine {
    pub fn new(config: CorrelationConfig) -> Self {
        Self {
            config,
            state: Mutex::new(EngineState {
                entities: HashMap::new(),
                by_type: HashMap::new(),
                result_cache: HashMap::new(),
            }),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            correlations_computed: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Add an entity to the pool. Replaces any entity with the same id.
    pub fn add_entity(&self, entity: EntityRef) {
        let mut state = self.lock_state();
        let ids = state.by_type.entry(entity.entity_type).or_default();
        if !ids.contains(&entity.id) {
            ids.push(entity.id.clone());
        }
        state.entities.insert(entity.id.clone(), entity);
    }

    /// Remove an entity from the pool. Cached results referencing it are
    /// left untouched.
    pub fn remove_entity(&self, entity_id: &str) -> bool {
        let mut state = self.lock_state();
        let Some(entity) = state.entities.remove(entity_id) else {
            return false;
        };
        if let Some(ids) = state.by_type.get_mut(&entity.entity_type) {
            ids.retain(|id| id != entity_id);
        }
        true
    }

    pub fn entity_count(&self) -> usize {
        self.lock_state().entities.len()
    }

    /// Drop the cached result for one entity id.
    pub fn invalidate(&self, entity_id: &str) -> bool {
        self.lock_state().result_cache.remove(entity_id).is_some()
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.lock_state().result_cache.clear();
    }

    /// Extract entity candidates from the signal, correlate each against
    /// the pool, then register the candidates into the pool for future
    /// signals to match against.
    pub fn correlate(&self, signal: &Signal) -> Vec<EntityCorrelations> {
        let candidates = extract::extract_candidates(signal);
        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let result = self.find_correlations(&candidate);
            self.add_entity(candidate.clone());
            results.push(EntityCorrelations {
                entity: candidate,
                result,
            });
        }
        results
    }

    /// Correlate one entity against every pool entity of the same type.
    ///
    /// A cached result for this entity id is returned verbatim. Otherwise
    /// the four strategies run, results are merged, filtered to
    /// `min_correlation_score`, truncated to `max_correlations_per_entity`
    /// (first-found kept), pattern-scanned, and cached.
    pub fn find_correlations(&self, entity: &EntityRef) -> CorrelationResult {
        let mut state = self.lock_state();

        if let Some(cached) = state.result_cache.get(&entity.id) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return cached.clone();
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        let mut correlations = Vec::new();
        if let Some(ids) = state.by_type.get(&entity.entity_type) {
            for id in ids {
                if id == &entity.id {
                    continue;
                }
                let Some(other) = state.entities.get(id) else {
                    continue;
                };
                self.match_pair(entity, other, &mut correlations);
            }
        }

        correlations.retain(|c| c.score >= self.config.min_correlation_score);
        correlations.truncate(self.config.max_correlations_per_entity);
        self.correlations_computed
            .fetch_add(correlations.len() as u64, Ordering::Relaxed);

        let patterns = patterns::detect_patterns(&correlations);
        if !correlations.is_empty() {
            debug!(
                entity_id = %entity.id,
                correlations = correlations.len(),
                patterns = patterns.len(),
                "correlations found"
            );
        }

        let result = CorrelationResult {
            entity_id: entity.id.clone(),
            correlations,
            patterns,
        };
        state
            .result_cache
            .insert(entity.id.clone(), result.clone());
        result
    }

    /// Run all four strategies for one (query, pool) pair.
    fn match_pair(&self, entity: &EntityRef, other: &EntityRef, out: &mut Vec<Correlation>) {
        if let Some(score) = strategies::exact_score(entity, other) {
            if score >= self.config.exact_match_threshold {
                out.push(Correlation::new(
                    &entity.id,
                    &other.id,
                    CorrelationType::Exact,
                    score,
                    other.timestamp,
                ));
            }
        }
        if let Some(score) = strategies::fuzzy_score(entity, other) {
            if score >= self.config.fuzzy_match_threshold {
                out.push(Correlation::new(
                    &entity.id,
                    &other.id,
                    CorrelationType::Fuzzy,
                    score,
                    other.timestamp,
                ));
            }
        }
        if let Some(score) =
            strategies::temporal_score(entity, other, self.config.temporal_window_hours)
        {
            out.push(Correlation::new(
                &entity.id,
                &other.id,
                CorrelationType::Temporal,
                score,
                other.timestamp,
            ));
        }
        if let Some(score) =
            strategies::geographic_score(entity, other, self.config.geographic_radius_meters)
        {
            out.push(Correlation::new(
                &entity.id,
                &other.id,
                CorrelationType::Geographic,
                score,
                other.timestamp,
            ));
        }
    }

    /// Infer a threat trajectory from the entity's cached temporal
    /// correlations. Needs a cached result with at least three temporal
    /// members.
    pub fn infer_threat_trajectory(&self, entity_id: &str) -> Option<ThreatTrajectory> {
        let state = self.lock_state();
        let result = state.result_cache.get(entity_id)?;
        let entity_type = state
            .entities
            .get(entity_id)
            .map(|e| e.entity_type)
            .unwrap_or(EntityType::Person);

        let mut temporal: Vec<Correlation> = result
            .correlations
            .iter()
            .filter(|c| c.correlation_type == CorrelationType::Temporal)
            .cloned()
            .collect();
        if temporal.len() < MIN_TEMPORAL_SAMPLES {
            return None;
        }
        temporal.sort_by_key(|c| c.matched_at);

        Some(trajectory::build(
            entity_id,
            entity_type,
            &temporal,
            self.config.temporal_window_hours,
        ))
    }

    pub fn stats(&self) -> CorrelationStats {
        let state = self.lock_state();
        CorrelationStats {
            entities: state.entities.len(),
            cached_results: state.result_cache.len(),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            correlations_computed: self.correlations_computed.load(Ordering::Relaxed),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new(CorrelationConfig::default())
    }
}
