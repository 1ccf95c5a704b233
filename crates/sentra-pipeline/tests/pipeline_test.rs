//! Pipeline runtime tests: backpressure, stage resolution, retry/drop,
//! output fan-out isolation, the merge variant, and lifecycle semantics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use sentra_core::config::PipelineConfig;
use sentra_core::errors::PipelineError;
use sentra_pipeline::{
    OutputHandler, Pipeline, PipelineItem, StageAction, StageProcessor,
};

#[derive(Default)]
struct RecordingOutput {
    items: Mutex<Vec<PipelineItem>>,
}

impl RecordingOutput {
    fn items(&self) -> Vec<PipelineItem> {
        self.items.lock().unwrap().clone()
    }
}

impl OutputHandler for RecordingOutput {
    fn on_item(&self, item: &PipelineItem) -> Result<(), String> {
        self.items.lock().unwrap().push(item.clone());
        Ok(())
    }
}

struct FailingOutput;

impl OutputHandler for FailingOutput {
    fn on_item(&self, _item: &PipelineItem) -> Result<(), String> {
        Err("sink unavailable".to_string())
    }
}

fn small_config(stages: &[&str]) -> PipelineConfig {
    PipelineConfig {
        name: "test".to_string(),
        queue_size: 8,
        worker_count: 2,
        poll_timeout_ms: 10,
        max_retries: 2,
        retry_delay_ms: 20,
        stages: stages.iter().map(|s| s.to_string()).collect(),
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn submit_signals_capacity_explicitly() {
    let pipeline = Arc::new(Pipeline::new(PipelineConfig {
        queue_size: 2,
        worker_count: 1,
        ..small_config(&["normalize"])
    }));
    // Start, then pause so nothing drains while we fill the queue.
    pipeline.start();
    pipeline.pause();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(pipeline.submit(json!({"n": 1})).is_ok());
    assert!(pipeline.submit(json!({"n": 2})).is_ok());
    match pipeline.submit(json!({"n": 3})) {
        Err(PipelineError::QueueFull { capacity }) => assert_eq!(capacity, 2),
        other => panic!("expected QueueFull, got {other:?}"),
    }
    pipeline.stop().await;
}

#[tokio::test]
async fn items_run_through_declared_stages_with_default_handlers() {
    let pipeline = Arc::new(Pipeline::new(small_config(&["normalize", "enrich", "publish"])));
    let output = Arc::new(RecordingOutput::default());
    pipeline.register_output_handler(output.clone());
    pipeline.start();

    pipeline.submit(json!({"k": "v"})).unwrap();
    wait_until(|| !output.items().is_empty()).await;

    let item = &output.items()[0];
    assert_eq!(item.stages_completed, vec!["normalize", "enrich", "publish"]);
    assert_eq!(pipeline.metrics().processed, 1);
    pipeline.stop().await;
}

struct TaggingProcessor(&'static str);

impl StageProcessor for TaggingProcessor {
    fn process(&self, _stage: &str, item: &mut PipelineItem) -> Result<StageAction, String> {
        sentra_core::value::stamp(&mut item.payload, "tagged_by", json!(self.0));
        Ok(StageAction::Continue)
    }
}

#[tokio::test]
async fn processor_object_wins_over_handler_function() {
    let pipeline = Arc::new(Pipeline::new(small_config(&["normalize"])));
    pipeline.register_processor("normalize", Arc::new(TaggingProcessor("processor")));
    pipeline.register_stage_handler(
        "normalize",
        Arc::new(|item: &mut PipelineItem| {
            sentra_core::value::stamp(&mut item.payload, "tagged_by", json!("handler"));
            Ok(StageAction::Continue)
        }),
    );
    let output = Arc::new(RecordingOutput::default());
    pipeline.register_output_handler(output.clone());
    pipeline.start();

    pipeline.submit(json!({})).unwrap();
    wait_until(|| !output.items().is_empty()).await;
    assert_eq!(output.items()[0].payload["tagged_by"], "processor");
    pipeline.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stage_errors_retry_then_drop() {
    let attempts = Arc::new(AtomicU64::new(0));
    let pipeline = Arc::new(Pipeline::new(small_config(&["explode"])));
    let counter = attempts.clone();
    pipeline.register_stage_handler(
        "explode",
        Arc::new(move |_item: &mut PipelineItem| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("boom".to_string())
        }),
    );
    pipeline.start();
    pipeline.submit(json!({})).unwrap();

    wait_until(|| pipeline.metrics().dropped == 1).await;

    // max_retries = 2: one initial attempt plus two retries.
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    let metrics = pipeline.metrics();
    assert_eq!(metrics.failed, 3);
    assert_eq!(metrics.retried, 2);
    assert_eq!(metrics.processed, 0);
    pipeline.stop().await;
}

#[tokio::test]
async fn one_output_handler_failure_does_not_block_the_others() {
    let pipeline = Arc::new(Pipeline::new(small_config(&["normalize"])));
    let recording = Arc::new(RecordingOutput::default());
    pipeline.register_output_handler(Arc::new(FailingOutput));
    pipeline.register_output_handler(recording.clone());
    pipeline.start();

    pipeline.submit(json!({"n": 1})).unwrap();
    wait_until(|| !recording.items().is_empty()).await;
    pipeline.stop().await;
}

#[tokio::test]
async fn fusion_merges_pairs_and_starves_lone_keys() {
    let (pipeline, merge) = Pipeline::fusion();
    let pipeline = Arc::new(pipeline);
    let output = Arc::new(RecordingOutput::default());
    pipeline.register_output_handler(output.clone());
    pipeline.start();

    pipeline
        .submit_item(PipelineItem::new(json!({"a": 1})).with_correlation_key("case-9"))
        .unwrap();
    pipeline
        .submit_item(PipelineItem::new(json!({"b": 2})).with_correlation_key("case-9"))
        .unwrap();
    pipeline
        .submit_item(PipelineItem::new(json!({"c": 3})).with_correlation_key("case-lone"))
        .unwrap();

    wait_until(|| !output.items().is_empty()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let items = output.items();
    assert_eq!(items.len(), 1, "only the merged pair completes");
    assert_eq!(items[0].merged_from.len(), 2);
    assert_eq!(items[0].payload["a"], 1);
    assert_eq!(items[0].payload["b"], 2);

    // The lone key never flushes on its own.
    assert_eq!(merge.pending_keys(), vec!["case-lone".to_string()]);
    pipeline.stop().await;
}

#[tokio::test]
async fn pause_keeps_queued_items_until_resume() {
    let pipeline = Arc::new(Pipeline::new(small_config(&["normalize"])));
    let output = Arc::new(RecordingOutput::default());
    pipeline.register_output_handler(output.clone());
    pipeline.start();
    pipeline.pause();
    tokio::time::sleep(Duration::from_millis(30)).await;

    pipeline.submit(json!({})).unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(output.items().is_empty());

    pipeline.resume();
    wait_until(|| !output.items().is_empty()).await;
    pipeline.stop().await;
}

#[tokio::test]
async fn stopped_pipeline_rejects_submissions() {
    let pipeline = Arc::new(Pipeline::new(small_config(&["normalize"])));
    pipeline.start();
    pipeline.stop().await;
    assert!(matches!(
        pipeline.submit(json!({})),
        Err(PipelineError::NotRunning)
    ));
}

#[tokio::test]
async fn submit_before_start_is_not_running() {
    let pipeline = Pipeline::new(small_config(&["normalize"]));
    assert!(matches!(
        pipeline.submit(json!({})),
        Err(PipelineError::NotRunning)
    ));
}
