//! Typed errors for the fusion platform.
//!
//! Capacity and backpressure are *return values* at the call sites that
//! produce them; these enums cover configuration failures, explicit queue
//! signals, and delivery outcomes. Bound-exhausted failures surface as
//! status fields on the affected records, not as panics.

/// Configuration errors. The only class of failure that is allowed to be
/// hard at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML document did not parse.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A threshold is outside its legal range.
    #[error("invalid threshold {field} = {value}")]
    InvalidThreshold { field: String, value: f64 },
}

/// Pipeline submission and stage errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The bounded input queue is at capacity; the caller owns retry/drop.
    #[error("pipeline queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// The pipeline has not been started or has been stopped.
    #[error("pipeline is not running")]
    NotRunning,

    /// A declared stage has no resolvable handler. Unreachable with the
    /// default stamp handler registered, kept for hosts that clear it.
    #[error("unknown stage: {0}")]
    UnknownStage(String),
}

/// Routing bookkeeping errors.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// The bounded delivery queue is at capacity.
    #[error("delivery queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// No routed alert with this id is tracked.
    #[error("unknown routed alert: {0}")]
    UnknownAlert(String),
}

/// Terminal outcome of one delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The handler did not complete within the delivery timeout.
    #[error("delivery to {destination} timed out after {secs}s")]
    Timeout { destination: String, secs: u64 },

    /// The handler reported a failure.
    #[error("delivery to {destination} failed: {message}")]
    Handler { destination: String, message: String },

    /// No handler is registered for the destination.
    #[error("no delivery handler for destination: {0}")]
    NoHandler(String),
}

/// Signal-processing errors inside the orchestrator's main loop.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// The signal's attribute payload is not an object tree.
    #[error("malformed signal {signal_id}: {reason}")]
    MalformedSignal { signal_id: String, reason: String },

    /// An internal queue closed underneath the loop.
    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),
}

/// Top-level error for embedders that want one type.
#[derive(Debug, thiserror::Error)]
pub enum SentraError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

pub type SentraResult<T> = Result<T, SentraError>;
