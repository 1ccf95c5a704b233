//! The rules engine: priority scoring, custom evaluators, score caching,
//! and per-entity risk profiles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::Utc;
use dashmap::DashMap;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sentra_core::config::RulesConfig;
use sentra_core::models::{
    PriorityScore, RiskProfile, RuleAttribution, ScoringRule, Signal, ThreatLevel,
};

use crate::builtin;
use crate::conditions;
use crate::risk;

/// Saturating denominator for the confidence heuristic.
const CONFIDENCE_RULE_SATURATION: f64 = 5.0;

/// A host-registered evaluator that can add labeled contributions beyond
/// the declarative rule set.
pub trait CustomEvaluator: Send + Sync {
    fn id(&self) -> &str;
    fn evaluate(&self, signal: &Signal) -> Option<RuleAttribution>;
}

/// Counters snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesReport {
    pub rules: usize,
    pub evaluations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub risk_profiles: usize,
}

type ScoreCacheKey = (String, String, String);

/// Scores an arbitrary attribute map against configurable rules into a
/// bounded priority number.
///
/// The optional score cache is keyed by (source, category, entity id),
/// not full signal content: two differently-shaped signals sharing that
/// triple reuse the first score. The cache has no TTL; only capacity
/// bounds it.
pub struct RulesEngine {
    config: RulesConfig,
    /// Kept sorted by descending priority.
    rules: RwLock<Vec<ScoringRule>>,
    evaluators: RwLock<Vec<Box<dyn CustomEvaluator>>>,
    score_cache: Option<Cache<ScoreCacheKey, PriorityScore>>,
    profiles: DashMap<String, RiskProfile>,
    evaluations: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl RulesEngine {
    pub fn new(config: RulesConfig) -> Self {
        let score_cache = config.cache_enabled.then(|| {
            Cache::builder()
                .max_capacity(config.cache_capacity)
                .build()
        });
        Self {
            config,
            rules: RwLock::new(Vec::new()),
            evaluators: RwLock::new(Vec::new()),
            score_cache,
            profiles: DashMap::new(),
            evaluations: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    /// A new engine preloaded with the stock rule set.
    pub fn with_default_rules(config: RulesConfig) -> Self {
        let engine = Self::new(config);
        for rule in builtin::default_rules() {
            engine.add_rule(rule);
        }
        engine
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    // ── Rule management ─────────────────────────────────────────────────

    pub fn add_rule(&self, rule: ScoringRule) {
        let mut rules = self.write_rules();
        rules.retain(|r| r.id != rule.id);
        rules.push(rule);
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn remove_rule(&self, rule_id: &str) -> bool {
        let mut rules = self.write_rules();
        let before = rules.len();
        rules.retain(|r| r.id != rule_id);
        rules.len() != before
    }

    pub fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> bool {
        let mut rules = self.write_rules();
        match rules.iter_mut().find(|r| r.id == rule_id) {
            Some(rule) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.read_rules().len()
    }

    pub fn register_evaluator(&self, evaluator: Box<dyn CustomEvaluator>) {
        self.evaluators
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(evaluator);
    }

    // ── Scoring ─────────────────────────────────────────────────────────

    /// Score one signal. Starts at the base score, applies enabled rules in
    /// descending priority order (AND-only conditions), clamps each rule's
    /// contribution, adds custom evaluator contributions, then clamps the
    /// total to the engine's bounds.
    pub fn calculate_priority(&self, signal: &Signal) -> PriorityScore {
        let key = self.cache_key(signal);
        if let Some(cache) = &self.score_cache {
            if let Some(cached) = cache.get(&key) {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                return cached;
            }
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }

        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let context = conditions::signal_context(signal);
        let mut total = self.config.default_base_score;
        let mut fired: Vec<RuleAttribution> = Vec::new();

        {
            let rules = self.read_rules();
            for rule in rules.iter() {
                if !rule.enabled {
                    continue;
                }
                if let Some(category) = rule.category {
                    if category != signal.category {
                        continue;
                    }
                }
                if !rule
                    .conditions
                    .iter()
                    .all(|c| conditions::evaluate(&context, c))
                {
                    continue;
                }

                let raw = if (rule.score_multiplier - 1.0).abs() > f64::EPSILON {
                    total * (rule.score_multiplier - 1.0)
                } else {
                    rule.score_modifier
                };
                let contribution = raw.clamp(rule.min_contribution, rule.max_contribution);
                total += contribution;
                fired.push(RuleAttribution {
                    rule_id: rule.id.clone(),
                    label: rule.id.clone(),
                    contribution,
                });
            }
        }

        {
            let evaluators = self.evaluators.read().unwrap_or_else(|e| e.into_inner());
            for evaluator in evaluators.iter() {
                if let Some(attribution) = evaluator.evaluate(signal) {
                    total += attribution.contribution;
                    fired.push(attribution);
                }
            }
        }

        let score = total.clamp(self.config.min_score, self.config.max_score);
        let result = PriorityScore {
            score,
            threat_level: ThreatLevel::from_score(score),
            confidence: (fired.len() as f64 / CONFIDENCE_RULE_SATURATION).min(1.0),
            fired,
        };

        debug!(
            signal_id = %signal.id,
            score = result.score,
            rules_fired = result.fired.len(),
            "priority calculated"
        );

        if let Some(cache) = &self.score_cache {
            cache.insert(key, result.clone());
        }
        result
    }

    /// Build or update the per-entity risk profile from a new score.
    pub fn assess_threat(&self, entity_id: &str, score: &PriorityScore) -> RiskProfile {
        let mut profile = self
            .profiles
            .entry(entity_id.to_string())
            .or_insert_with(|| RiskProfile {
                entity_id: entity_id.to_string(),
                historical_scores: Vec::new(),
                trend: sentra_core::models::RiskTrend::Stable,
                threat_level: ThreatLevel::Minimal,
                recommendations: Vec::new(),
                updated_at: Utc::now(),
            });

        profile.historical_scores.push((Utc::now(), score.score));
        profile.trend = risk::derive_trend(&profile.historical_scores);
        profile.threat_level = score.threat_level;
        profile.recommendations = risk::recommendations_for(score.threat_level);
        profile.updated_at = Utc::now();
        profile.clone()
    }

    pub fn risk_profile(&self, entity_id: &str) -> Option<RiskProfile> {
        self.profiles.get(entity_id).map(|p| p.clone())
    }

    pub fn report(&self) -> RulesReport {
        RulesReport {
            rules: self.rule_count(),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            risk_profiles: self.profiles.len(),
        }
    }

    fn cache_key(&self, signal: &Signal) -> ScoreCacheKey {
        (
            signal.source.as_str().to_string(),
            signal.category.as_str().to_string(),
            signal.entity_id().unwrap_or_default().to_string(),
        )
    }

    fn read_rules(&self) -> std::sync::RwLockReadGuard<'_, Vec<ScoringRule>> {
        self.rules.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_rules(&self) -> std::sync::RwLockWriteGuard<'_, Vec<ScoringRule>> {
        self.rules.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new(RulesConfig::default())
    }
}
