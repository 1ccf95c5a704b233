// Single source of truth for all default values.

// --- Orchestrator ---
pub const DEFAULT_SIGNAL_QUEUE_SIZE: usize = 1_000;
pub const DEFAULT_FUSION_QUEUE_SIZE: usize = 256;
pub const DEFAULT_BATCH_SIZE: usize = 25;
pub const DEFAULT_BATCH_WINDOW_MS: u64 = 250;
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.6;
pub const DEFAULT_PRIORITY_THRESHOLD: f64 = 30.0;
pub const DEFAULT_HIGH_CONFIDENCE_THRESHOLD: f64 = 0.9;
pub const DEFAULT_DEGRADED_ERROR_THRESHOLD: u32 = 10;
pub const DEFAULT_SOURCE_RELIABILITY: f64 = 0.80;

// --- Pipeline ---
pub const DEFAULT_PIPELINE_QUEUE_SIZE: usize = 512;
pub const DEFAULT_PIPELINE_WORKERS: usize = 2;
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
pub const MERGE_BUFFER_FLUSH_COUNT: usize = 2;

// --- Correlation ---
pub const DEFAULT_TEMPORAL_WINDOW_HOURS: f64 = 24.0;
pub const DEFAULT_GEOGRAPHIC_RADIUS_METERS: f64 = 1_000.0;
pub const DEFAULT_MIN_CORRELATION_SCORE: f64 = 0.4;
pub const DEFAULT_MAX_CORRELATIONS_PER_ENTITY: usize = 100;
pub const DEFAULT_EXACT_MATCH_THRESHOLD: f64 = 0.95;
pub const DEFAULT_FUZZY_MATCH_THRESHOLD: f64 = 0.75;
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// --- Rules ---
pub const DEFAULT_BASE_SCORE: f64 = 50.0;
pub const DEFAULT_MIN_SCORE: f64 = 0.0;
pub const DEFAULT_MAX_SCORE: f64 = 100.0;
pub const DEFAULT_SCORE_CACHE_CAPACITY: u64 = 10_000;

// --- Router ---
pub const DEFAULT_MAX_CONCURRENT_DELIVERIES: usize = 4;
pub const DELIVERY_WORKER_CAP: usize = 4;
pub const DEFAULT_DELIVERY_QUEUE_SIZE: usize = 512;
pub const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
pub const DELIVERY_LATENCY_EMA_OLD_WEIGHT: f64 = 0.9;
pub const DELIVERY_LATENCY_EMA_NEW_WEIGHT: f64 = 0.1;

// --- Destinations ---
pub const DEST_OFFICER_SAFETY: &str = "officer_safety_channel";
pub const DEST_DISPATCH: &str = "dispatch";
pub const DEST_MOBILE_UNITS: &str = "mobile_units";
pub const DEST_INVESTIGATIONS: &str = "investigations";
pub const DEST_INTEL_DESK: &str = "intel_desk";
pub const DEST_RECORDS: &str = "records";
pub const DEST_PATROL_BULLETIN: &str = "patrol_bulletin";

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
