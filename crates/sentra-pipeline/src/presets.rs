//! Named urgency-tiered pipeline instances.
//!
//! Each differs only in queue size, poll timing, worker count, declared
//! stage list, and stage overrides.

use std::sync::Arc;

use sentra_core::config::PipelineConfig;

use crate::merge::CorrelationMergeProcessor;
use crate::pipeline::Pipeline;

fn config(
    name: &str,
    queue_size: usize,
    worker_count: usize,
    poll_timeout_ms: u64,
    max_retries: u32,
    stages: &[&str],
) -> PipelineConfig {
    PipelineConfig {
        name: name.to_string(),
        queue_size,
        worker_count,
        poll_timeout_ms,
        max_retries,
        stages: stages.iter().map(|s| s.to_string()).collect(),
        ..PipelineConfig::default()
    }
}

impl Pipeline {
    /// Fast path for officer-safety traffic: small queue, many workers,
    /// tight polling, one retry at most.
    pub fn officer_safety() -> Pipeline {
        Pipeline::new(config(
            "officer_safety",
            128,
            4,
            25,
            1,
            &["normalize", "threat_assessment", "dispatch_prep"],
        ))
    }

    /// Bulk replay of archived signals: deep queue, relaxed polling.
    pub fn batch_replay() -> Pipeline {
        Pipeline::new(config(
            "batch_replay",
            4_096,
            2,
            250,
            3,
            &["normalize", "deduplicate", "archive_prep"],
        ))
    }

    /// Correlation-key fusion: items sharing a key merge into one synthetic
    /// item at the merge stage.
    pub fn fusion() -> (Pipeline, Arc<CorrelationMergeProcessor>) {
        let pipeline = Pipeline::new(config(
            "fusion",
            512,
            2,
            100,
            2,
            &["normalize", "merge", "finalize"],
        ));
        let merge = Arc::new(CorrelationMergeProcessor::new());
        pipeline.register_processor("merge", merge.clone());
        (pipeline, merge)
    }

    /// Investigative lead generation.
    pub fn lead_generation() -> Pipeline {
        Pipeline::new(config(
            "lead_generation",
            512,
            2,
            100,
            2,
            &["normalize", "entity_extraction", "lead_scoring"],
        ))
    }

    /// Analyst feedback ingestion: single worker keeps application ordered.
    pub fn feedback() -> Pipeline {
        Pipeline::new(config(
            "feedback",
            256,
            1,
            200,
            2,
            &["normalize", "feedback_apply"],
        ))
    }
}
