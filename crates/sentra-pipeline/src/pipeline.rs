//! The pipeline runtime: bounded intake, worker loops, bounded retry,
//! output fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use sentra_core::config::PipelineConfig;
use sentra_core::errors::PipelineError;

use crate::item::{ItemStatus, PipelineItem};
use crate::stage::{OutputHandler, PassThroughProcessor, StageAction, StageHandlerFn, StageProcessor};

/// Counters snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineMetrics {
    pub name: String,
    pub submitted: u64,
    pub processed: u64,
    pub failed: u64,
    pub retried: u64,
    pub dropped: u64,
    pub per_stage: HashMap<String, u64>,
}

/// Bounded-queue, multi-worker, multi-stage pipeline.
///
/// `submit` either enqueues or returns an explicit capacity signal; it
/// never blocks indefinitely and never silently drops. Stage errors retry
/// a bounded number of times with a fixed delay, then the item is dropped
/// and counted; the pipeline keeps running. `stop` abandons whatever is
/// still queued.
pub struct Pipeline {
    config: PipelineConfig,
    input_tx: mpsc::Sender<PipelineItem>,
    input_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<PipelineItem>>>,
    output_tx: mpsc::Sender<PipelineItem>,
    output_rx: Mutex<Option<mpsc::Receiver<PipelineItem>>>,
    processors: RwLock<HashMap<String, Arc<dyn StageProcessor>>>,
    handlers: RwLock<HashMap<String, StageHandlerFn>>,
    default_processor: Arc<dyn StageProcessor>,
    output_handlers: RwLock<Vec<Arc<dyn OutputHandler>>>,
    running: AtomicBool,
    paused: AtomicBool,
    submitted: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
    per_stage: DashMap<String, u64>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let (input_tx, input_rx) = mpsc::channel(config.queue_size.max(1));
        let (output_tx, output_rx) = mpsc::channel(config.queue_size.max(1));
        Self {
            config,
            input_tx,
            input_rx: Arc::new(tokio::sync::Mutex::new(input_rx)),
            output_tx,
            output_rx: Mutex::new(Some(output_rx)),
            processors: RwLock::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
            default_processor: Arc::new(PassThroughProcessor),
            output_handlers: RwLock::new(Vec::new()),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            submitted: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            retried: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            per_stage: DashMap::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // ── Registration ────────────────────────────────────────────────────

    pub fn register_processor(&self, stage: impl Into<String>, processor: Arc<dyn StageProcessor>) {
        self.write_processors().insert(stage.into(), processor);
    }

    pub fn register_stage_handler(&self, stage: impl Into<String>, handler: StageHandlerFn) {
        self.write_handlers().insert(stage.into(), handler);
    }

    pub fn register_output_handler(&self, handler: Arc<dyn OutputHandler>) {
        self.output_handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(handler);
    }

    // ── Intake ──────────────────────────────────────────────────────────

    /// Enqueue a payload. Returns the generated item id, or the explicit
    /// capacity/state signal.
    pub fn submit(&self, payload: serde_json::Value) -> Result<String, PipelineError> {
        self.submit_item(PipelineItem::new(payload))
    }

    /// Enqueue a pre-built item (used by hosts that set correlation keys).
    pub fn submit_item(&self, item: PipelineItem) -> Result<String, PipelineError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(PipelineError::NotRunning);
        }
        let id = item.id.clone();
        match self.input_tx.try_send(item) {
            Ok(()) => {
                self.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(id)
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(PipelineError::QueueFull {
                capacity: self.config.queue_size,
            }),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(PipelineError::NotRunning),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Spawn the worker loops and the output loop.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut tasks = self.lock_tasks();
        for worker_idx in 0..self.config.worker_count.max(1) {
            let pipeline = Arc::clone(self);
            tasks.push(tokio::spawn(async move {
                pipeline.worker_loop(worker_idx).await;
            }));
        }
        let pipeline = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            pipeline.output_loop().await;
        }));
        info!(
            pipeline = %self.config.name,
            workers = self.config.worker_count,
            queue = self.config.queue_size,
            "pipeline started"
        );
    }

    /// Workers idle without dequeuing; queued items persist.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    /// Cancel every worker. Queued-but-unprocessed items are abandoned; no
    /// drain guarantee.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let tasks: Vec<JoinHandle<()>> = {
            let mut guard = self.lock_tasks();
            guard.drain(..).collect()
        };
        for task in tasks {
            task.abort();
            let _ = task.await;
        }
        info!(pipeline = %self.config.name, "pipeline stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> PipelineMetrics {
        PipelineMetrics {
            name: self.config.name.clone(),
            submitted: self.submitted.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            per_stage: self
                .per_stage
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
        }
    }

    // ── Workers ─────────────────────────────────────────────────────────

    async fn worker_loop(self: Arc<Self>, worker_idx: usize) {
        let poll = Duration::from_millis(self.config.poll_timeout_ms.max(1));
        debug!(pipeline = %self.config.name, worker = worker_idx, "worker started");
        loop {
            if !self.running.load(Ordering::Acquire) {
                break;
            }
            if self.paused.load(Ordering::Acquire) {
                tokio::time::sleep(poll).await;
                continue;
            }
            let next = {
                let mut rx = self.input_rx.lock().await;
                tokio::time::timeout(poll, rx.recv()).await
            };
            match next {
                Ok(Some(item)) => self.process_item(item).await,
                Ok(None) => break,
                Err(_) => continue,
            }
        }
    }

    async fn process_item(&self, mut item: PipelineItem) {
        item.status = ItemStatus::Processing;
        for stage in self.config.stages.clone() {
            match self.run_stage(&stage, &mut item) {
                Ok(StageAction::Continue) => {
                    item.stages_completed.push(stage.clone());
                    *self.per_stage.entry(stage).or_insert(0) += 1;
                }
                Ok(StageAction::Consume) => return,
                Err(message) => {
                    item.status = ItemStatus::Error;
                    item.errors.push(message.clone());
                    self.failed.fetch_add(1, Ordering::Relaxed);

                    if item.retries < self.config.max_retries {
                        item.retries += 1;
                        self.retried.fetch_add(1, Ordering::Relaxed);
                        let tx = self.input_tx.clone();
                        let delay = Duration::from_millis(self.config.retry_delay_ms);
                        debug!(
                            pipeline = %self.config.name,
                            item_id = %item.id,
                            retry = item.retries,
                            stage = %stage,
                            "stage error, scheduling retry"
                        );
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            if let Err(e) = tx.send(item).await {
                                warn!(error = %e, "retry re-enqueue failed, item lost");
                            }
                        });
                    } else {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            pipeline = %self.config.name,
                            item_id = %item.id,
                            stage = %stage,
                            error = %message,
                            "retries exhausted, dropping item"
                        );
                    }
                    return;
                }
            }
        }
        item.status = ItemStatus::Completed;
        self.processed.fetch_add(1, Ordering::Relaxed);
        if self.output_tx.send(item).await.is_err() {
            warn!(pipeline = %self.config.name, "output channel closed");
        }
    }

    /// Resolve the stage's handler: processor object, then handler
    /// function, then the default pass-through.
    fn run_stage(&self, stage: &str, item: &mut PipelineItem) -> Result<StageAction, String> {
        if let Some(processor) = self.read_processors().get(stage).cloned() {
            return processor.process(stage, item);
        }
        if let Some(handler) = self.read_handlers().get(stage).cloned() {
            return handler(item);
        }
        self.default_processor.process(stage, item)
    }

    async fn output_loop(self: Arc<Self>) {
        let receiver = {
            let mut guard = self.output_rx.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };
        let Some(mut rx) = receiver else {
            warn!(pipeline = %self.config.name, "output loop already running");
            return;
        };
        while let Some(item) = rx.recv().await {
            let handlers: Vec<Arc<dyn OutputHandler>> = self
                .output_handlers
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            for handler in handlers {
                if let Err(e) = handler.on_item(&item) {
                    warn!(
                        pipeline = %self.config.name,
                        item_id = %item.id,
                        error = %e,
                        "output handler failed"
                    );
                }
            }
        }
    }

    fn read_processors(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<dyn StageProcessor>>> {
        self.processors.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_processors(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<dyn StageProcessor>>> {
        self.processors.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_handlers(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, StageHandlerFn>> {
        self.handlers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_handlers(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, StageHandlerFn>> {
        self.handlers.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
