//! Per-subsystem configuration, serde-loadable and defaulting from the
//! constants in [`defaults`].

pub mod defaults;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::models::{AlertTier, SignalSource};

/// Orchestrator thresholds, queue sizes, and per-source tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub signal_queue_size: usize,
    pub fusion_queue_size: usize,
    /// Batch drain flushes at this many signals or at `batch_window_ms`,
    /// whichever comes first.
    pub batch_size: usize,
    pub batch_window_ms: u64,
    /// Fusion gate: eligible when max correlation score reaches this.
    pub correlation_threshold: f64,
    /// Fusion gate: eligible when priority reaches this.
    pub priority_threshold: f64,
    /// Fusion gate: eligible when enriched confidence reaches this.
    pub high_confidence_threshold: f64,
    /// Consecutive processing errors before the advisory degraded flag sets.
    pub degraded_error_threshold: u32,
    pub disabled_sources: Vec<SignalSource>,
    /// Static reliability multiplier applied to confidence during
    /// enrichment. Sources absent from the table use
    /// `default_source_reliability`.
    pub source_reliability: HashMap<SignalSource, f64>,
    pub default_source_reliability: f64,
    /// Tier-keyed routing destinations stamped onto fused alerts.
    pub tier_destinations: HashMap<AlertTier, Vec<String>>,
    /// Source-specific destination additions.
    pub source_destinations: HashMap<SignalSource, Vec<String>>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            signal_queue_size: defaults::DEFAULT_SIGNAL_QUEUE_SIZE,
            fusion_queue_size: defaults::DEFAULT_FUSION_QUEUE_SIZE,
            batch_size: defaults::DEFAULT_BATCH_SIZE,
            batch_window_ms: defaults::DEFAULT_BATCH_WINDOW_MS,
            correlation_threshold: defaults::DEFAULT_CORRELATION_THRESHOLD,
            priority_threshold: defaults::DEFAULT_PRIORITY_THRESHOLD,
            high_confidence_threshold: defaults::DEFAULT_HIGH_CONFIDENCE_THRESHOLD,
            degraded_error_threshold: defaults::DEFAULT_DEGRADED_ERROR_THRESHOLD,
            disabled_sources: Vec::new(),
            source_reliability: default_source_reliability(),
            default_source_reliability: defaults::DEFAULT_SOURCE_RELIABILITY,
            tier_destinations: default_tier_destinations(),
            source_destinations: default_source_destinations(),
        }
    }
}

/// Pipeline instance parameters; urgency-tiered presets differ only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub name: String,
    pub queue_size: usize,
    pub worker_count: usize,
    pub poll_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Declared stage list, executed in order.
    pub stages: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            queue_size: defaults::DEFAULT_PIPELINE_QUEUE_SIZE,
            worker_count: defaults::DEFAULT_PIPELINE_WORKERS,
            poll_timeout_ms: defaults::DEFAULT_POLL_TIMEOUT_MS,
            max_retries: defaults::DEFAULT_MAX_RETRIES,
            retry_delay_ms: defaults::DEFAULT_RETRY_DELAY_MS,
            stages: vec!["normalize".to_string()],
        }
    }
}

/// Correlation engine thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub temporal_window_hours: f64,
    pub geographic_radius_meters: f64,
    /// Correlations below this score are discarded after merging.
    pub min_correlation_score: f64,
    /// First-found kept on truncation.
    pub max_correlations_per_entity: usize,
    pub exact_match_threshold: f64,
    pub fuzzy_match_threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            temporal_window_hours: defaults::DEFAULT_TEMPORAL_WINDOW_HOURS,
            geographic_radius_meters: defaults::DEFAULT_GEOGRAPHIC_RADIUS_METERS,
            min_correlation_score: defaults::DEFAULT_MIN_CORRELATION_SCORE,
            max_correlations_per_entity: defaults::DEFAULT_MAX_CORRELATIONS_PER_ENTITY,
            exact_match_threshold: defaults::DEFAULT_EXACT_MATCH_THRESHOLD,
            fuzzy_match_threshold: defaults::DEFAULT_FUZZY_MATCH_THRESHOLD,
        }
    }
}

/// Rules engine bounds and cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub default_base_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// Score cache keyed by (source, category, entity id) — not full signal
    /// content. Two differently-shaped signals sharing that triple reuse the
    /// first score.
    pub cache_enabled: bool,
    pub cache_capacity: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            default_base_score: defaults::DEFAULT_BASE_SCORE,
            min_score: defaults::DEFAULT_MIN_SCORE,
            max_score: defaults::DEFAULT_MAX_SCORE,
            cache_enabled: true,
            cache_capacity: defaults::DEFAULT_SCORE_CACHE_CAPACITY,
        }
    }
}

/// Alerts router delivery parameters and destination tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub max_concurrent_deliveries: usize,
    pub delivery_queue_size: usize,
    pub delivery_timeout_secs: u64,
    pub retry_attempts: u32,
    /// Fixed delay between retries; no exponential backoff.
    pub retry_delay_secs: u64,
    pub tier_destinations: HashMap<AlertTier, Vec<String>>,
    pub default_destinations: Vec<String>,
    /// Feature-flagged-off destinations, removed from every resolution.
    pub disabled_destinations: Vec<String>,
    /// Destinations that synthesize an advisory bulletin before delivery.
    pub advisory_destinations: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_concurrent_deliveries: defaults::DEFAULT_MAX_CONCURRENT_DELIVERIES,
            delivery_queue_size: defaults::DEFAULT_DELIVERY_QUEUE_SIZE,
            delivery_timeout_secs: defaults::DEFAULT_DELIVERY_TIMEOUT_SECS,
            retry_attempts: defaults::DEFAULT_RETRY_ATTEMPTS,
            retry_delay_secs: defaults::DEFAULT_RETRY_DELAY_SECS,
            tier_destinations: default_tier_destinations(),
            default_destinations: vec![defaults::DEST_INTEL_DESK.to_string()],
            disabled_destinations: Vec::new(),
            advisory_destinations: vec![
                defaults::DEST_MOBILE_UNITS.to_string(),
                defaults::DEST_PATROL_BULLETIN.to_string(),
            ],
        }
    }
}

/// Aggregated configuration for the whole platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentraConfig {
    pub orchestrator: OrchestratorConfig,
    pub correlation: CorrelationConfig,
    pub rules: RulesConfig,
    pub router: RouterConfig,
}

impl SentraConfig {
    /// Parse a TOML document; unknown fields are ignored, missing ones
    /// default.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: SentraConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("orchestrator.correlation_threshold", self.orchestrator.correlation_threshold),
            ("orchestrator.high_confidence_threshold", self.orchestrator.high_confidence_threshold),
            ("correlation.min_correlation_score", self.correlation.min_correlation_score),
            ("correlation.exact_match_threshold", self.correlation.exact_match_threshold),
            ("correlation.fuzzy_match_threshold", self.correlation.fuzzy_match_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }
        if self.rules.min_score > self.rules.max_score {
            return Err(ConfigError::InvalidThreshold {
                field: "rules.min_score".to_string(),
                value: self.rules.min_score,
            });
        }
        Ok(())
    }
}

/// The stock tier table. T1 always carries the officer-safety, dispatch,
/// and mobile-unit destinations.
pub fn default_tier_destinations() -> HashMap<AlertTier, Vec<String>> {
    HashMap::from([
        (
            AlertTier::T1,
            vec![
                defaults::DEST_OFFICER_SAFETY.to_string(),
                defaults::DEST_DISPATCH.to_string(),
                defaults::DEST_MOBILE_UNITS.to_string(),
            ],
        ),
        (
            AlertTier::T2,
            vec![
                defaults::DEST_DISPATCH.to_string(),
                defaults::DEST_INVESTIGATIONS.to_string(),
            ],
        ),
        (
            AlertTier::T3,
            vec![
                defaults::DEST_INVESTIGATIONS.to_string(),
                defaults::DEST_INTEL_DESK.to_string(),
            ],
        ),
        (AlertTier::T4, vec![defaults::DEST_RECORDS.to_string()]),
    ])
}

fn default_source_reliability() -> HashMap<SignalSource, f64> {
    HashMap::from([
        (SignalSource::OfficerSafety, 0.98),
        (SignalSource::Dispatch, 0.95),
        (SignalSource::Forensics, 0.95),
        (SignalSource::Anpr, 0.90),
        (SignalSource::FieldReport, 0.85),
        (SignalSource::Partner, 0.80),
        (SignalSource::Osint, 0.70),
        (SignalSource::TipLine, 0.60),
    ])
}

fn default_source_destinations() -> HashMap<SignalSource, Vec<String>> {
    HashMap::from([
        (
            SignalSource::OfficerSafety,
            vec![defaults::DEST_PATROL_BULLETIN.to_string()],
        ),
        (
            SignalSource::Anpr,
            vec![defaults::DEST_MOBILE_UNITS.to_string()],
        ),
    ])
}
