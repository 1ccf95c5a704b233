//! # sentra-pipeline
//!
//! A generic bounded-queue, multi-worker, multi-stage execution primitive.
//! Urgency-tiered instances differ only in queue size, poll timing, worker
//! count, declared stage list, and stage overrides; the rest is shared.
//!
//! ## Modules
//!
//! - `item` — the unit of work and its status lifecycle
//! - `stage` — stage processor/handler seams and the default pass-through
//! - `pipeline` — the `Pipeline` runtime (workers, retries, output fan-out)
//! - `merge` — the correlation-key merge buffer stage
//! - `presets` — named urgency-tiered instances

pub mod item;
pub mod merge;
pub mod pipeline;
pub mod presets;
pub mod stage;

pub use item::{ItemStatus, PipelineItem};
pub use merge::CorrelationMergeProcessor;
pub use pipeline::{Pipeline, PipelineMetrics};
pub use stage::{OutputHandler, StageAction, StageHandlerFn, StageProcessor};
