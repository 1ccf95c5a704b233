//! The orchestrator: run-state machine, signal intake, the main batch
//! loop, and the fusion side-effects loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use sentra_core::config::OrchestratorConfig;
use sentra_core::errors::ProcessingError;
use sentra_core::models::{BroadcastFrame, FusedAlert, Signal, SignalSource};
use sentra_core::traits::{
    AuditLog, InMemoryAuditLog, KnowledgeGraphSync, NoopKnowledgeGraph, SignalNormalizer,
    StampNormalizer,
};
use sentra_correlation::CorrelationEngine;
use sentra_router::AlertRouter;
use sentra_rules::RulesEngine;

use crate::processing;

/// Broadcast channel depth per subscriber.
const SUBSCRIBER_CHANNEL_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Initializing,
    Running,
    Paused,
    Stopped,
}

/// Counters snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorMetrics {
    pub state: RunState,
    /// Advisory only; never auto-clears and never halts intake.
    pub degraded: bool,
    pub ingested: u64,
    pub rejected: u64,
    pub processed: u64,
    pub fused: u64,
    pub errors: u64,
    pub consecutive_errors: u32,
    pub subscribers: usize,
}

/// Owns signal intake and the normalize → enrich → correlate → score →
/// fuse sequence. Fused alerts flow to a separate side-effects task.
pub struct Orchestrator {
    config: OrchestratorConfig,
    state: RwLock<RunState>,
    degraded: AtomicBool,
    consecutive_errors: AtomicU32,
    ingested: AtomicU64,
    rejected: AtomicU64,
    processed: AtomicU64,
    fused: AtomicU64,
    errors: AtomicU64,
    signal_tx: mpsc::Sender<Signal>,
    signal_rx: Mutex<Option<mpsc::Receiver<Signal>>>,
    fusion_tx: mpsc::Sender<FusedAlert>,
    fusion_rx: Mutex<Option<mpsc::Receiver<FusedAlert>>>,
    correlator: Arc<CorrelationEngine>,
    rules: Arc<RulesEngine>,
    router: Arc<AlertRouter>,
    knowledge_graph: Arc<dyn KnowledgeGraphSync>,
    audit: Arc<dyn AuditLog>,
    normalizers: RwLock<HashMap<SignalSource, Arc<dyn SignalNormalizer>>>,
    default_normalizer: Arc<dyn SignalNormalizer>,
    subscribers: Mutex<Vec<mpsc::Sender<BroadcastFrame>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        correlator: Arc<CorrelationEngine>,
        rules: Arc<RulesEngine>,
        router: Arc<AlertRouter>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(config.signal_queue_size.max(1));
        let (fusion_tx, fusion_rx) = mpsc::channel(config.fusion_queue_size.max(1));
        Self {
            config,
            state: RwLock::new(RunState::Initializing),
            degraded: AtomicBool::new(false),
            consecutive_errors: AtomicU32::new(0),
            ingested: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            fused: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            signal_tx,
            signal_rx: Mutex::new(Some(signal_rx)),
            fusion_tx,
            fusion_rx: Mutex::new(Some(fusion_rx)),
            correlator,
            rules,
            router,
            knowledge_graph: Arc::new(NoopKnowledgeGraph),
            audit: Arc::new(InMemoryAuditLog::new()),
            normalizers: RwLock::new(HashMap::new()),
            default_normalizer: Arc::new(StampNormalizer),
            subscribers: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_knowledge_graph(mut self, knowledge_graph: Arc<dyn KnowledgeGraphSync>) -> Self {
        self.knowledge_graph = knowledge_graph;
        self
    }

    pub fn with_audit_log(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// Override normalization for one source; all others use the stamp
    /// normalizer.
    pub fn register_normalizer(&self, source: SignalSource, normalizer: Arc<dyn SignalNormalizer>) {
        self.normalizers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(source, normalizer);
    }

    /// Subscribe to fused-alert broadcast frames. Dropping the receiver
    /// unregisters: dead subscribers are pruned silently on the next send.
    pub fn subscribe(&self) -> mpsc::Receiver<BroadcastFrame> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_SIZE);
        self.lock_subscribers().push(tx);
        rx
    }

    // ── Intake ──────────────────────────────────────────────────────────

    /// Non-blocking enqueue. Returns `false` (and counts the rejection)
    /// when the orchestrator is not running, the source is disabled, or
    /// the queue is full. The caller owns retry/drop.
    pub fn ingest_signal(&self, signal: Signal) -> bool {
        if self.run_state() != RunState::Running {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        if self.config.disabled_sources.contains(&signal.source) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            debug!(source = signal.source.as_str(), "signal from disabled source rejected");
            return false;
        }
        match self.signal_tx.try_send(signal) {
            Ok(()) => {
                self.ingested.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Sequential per-item intake; backpressure is per item only.
    pub fn ingest_signals_batch(&self, signals: Vec<Signal>) -> Vec<bool> {
        signals
            .into_iter()
            .map(|signal| self.ingest_signal(signal))
            .collect()
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Spawn the main processing loop and the fusion side-effects loop,
    /// then transition to Running.
    pub fn start(self: &Arc<Self>) {
        {
            let mut state = self.write_state();
            if *state == RunState::Running || *state == RunState::Paused {
                return;
            }
            *state = RunState::Running;
        }
        let mut tasks = self.lock_tasks();
        let orchestrator = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            orchestrator.main_loop().await;
        }));
        let orchestrator = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            orchestrator.fusion_loop().await;
        }));
        info!(
            batch_size = self.config.batch_size,
            batch_window_ms = self.config.batch_window_ms,
            "orchestrator started"
        );
    }

    /// Running ⇄ Paused. While paused, intake rejects and the main loop
    /// idles without draining; queued signals persist.
    pub fn pause(&self) {
        let mut state = self.write_state();
        if *state == RunState::Running {
            *state = RunState::Paused;
            info!("orchestrator paused");
        }
    }

    pub fn resume(&self) {
        let mut state = self.write_state();
        if *state == RunState::Paused {
            *state = RunState::Running;
            info!("orchestrator resumed");
        }
    }

    /// Cancel every spawned task and await acknowledgment. Queued but
    /// unprocessed signals are abandoned; no drain guarantee.
    pub async fn stop(&self) {
        {
            let mut state = self.write_state();
            *state = RunState::Stopped;
        }
        let tasks: Vec<JoinHandle<()>> = {
            let mut guard = self.lock_tasks();
            guard.drain(..).collect()
        };
        for task in tasks {
            task.abort();
            let _ = task.await;
        }
        info!("orchestrator stopped");
    }

    pub fn run_state(&self) -> RunState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> OrchestratorMetrics {
        OrchestratorMetrics {
            state: self.run_state(),
            degraded: self.is_degraded(),
            ingested: self.ingested.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            fused: self.fused.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            consecutive_errors: self.consecutive_errors.load(Ordering::Relaxed),
            subscribers: self.lock_subscribers().len(),
        }
    }

    // ── Main loop ───────────────────────────────────────────────────────

    async fn main_loop(self: Arc<Self>) {
        let receiver = {
            let mut guard = self.signal_rx.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };
        let Some(mut rx) = receiver else {
            warn!("main loop already consumed the signal receiver");
            return;
        };
        let window = Duration::from_millis(self.config.batch_window_ms.max(1));

        loop {
            match self.run_state() {
                RunState::Stopped => break,
                RunState::Paused => {
                    tokio::time::sleep(window).await;
                    continue;
                }
                _ => {}
            }

            let Some(batch) = self.drain_batch(&mut rx, window).await else {
                break;
            };
            for signal in batch {
                match self.process_signal(signal).await {
                    Ok(_) => {
                        self.consecutive_errors.store(0, Ordering::Release);
                    }
                    Err(error) => {
                        self.errors.fetch_add(1, Ordering::Relaxed);
                        let streak = self.consecutive_errors.fetch_add(1, Ordering::AcqRel) + 1;
                        warn!(error = %error, streak, "signal processing failed");
                        if streak >= self.config.degraded_error_threshold
                            && !self.degraded.swap(true, Ordering::AcqRel)
                        {
                            warn!(streak, "entering degraded mode (advisory)");
                        }
                    }
                }
            }
        }
    }

    /// Collect up to `batch_size` signals or until the window elapses,
    /// whichever comes first. `None` means the intake channel closed.
    async fn drain_batch(
        &self,
        rx: &mut mpsc::Receiver<Signal>,
        window: Duration,
    ) -> Option<Vec<Signal>> {
        let deadline = Instant::now() + window;
        let max_batch = self.config.batch_size.max(1);
        let mut batch = Vec::new();
        while batch.len() < max_batch {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Some(signal)) => batch.push(signal),
                Ok(None) => {
                    if batch.is_empty() {
                        return None;
                    }
                    break;
                }
                Err(_) => break,
            }
        }
        Some(batch)
    }

    async fn process_signal(&self, mut signal: Signal) -> Result<bool, ProcessingError> {
        if !signal.attributes.is_object() {
            return Err(ProcessingError::MalformedSignal {
                signal_id: signal.id.clone(),
                reason: "attributes is not an object".to_string(),
            });
        }

        let normalizer = self
            .normalizers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&signal.source)
            .cloned()
            .unwrap_or_else(|| self.default_normalizer.clone());
        normalizer.normalize(&mut signal);

        processing::enrich(&mut signal, &self.config);

        let entity_results = self.correlator.correlate(&signal);
        let max_correlation = entity_results
            .iter()
            .flat_map(|r| r.result.correlations.iter())
            .map(|c| c.score)
            .fold(0.0f64, f64::max);

        let priority = self.rules.calculate_priority(&signal);

        if let Some(entity) = entity_results.first() {
            self.rules.assess_threat(&entity.entity.id, &priority);
        }

        let eligible = processing::fusion_eligible(
            &self.config,
            max_correlation,
            priority.score,
            signal.confidence,
        );
        self.processed.fetch_add(1, Ordering::Relaxed);

        if !eligible {
            debug!(
                signal_id = %signal.id,
                max_correlation,
                priority = priority.score,
                confidence = signal.confidence,
                "signal below fusion gate"
            );
            return Ok(false);
        }

        let alert = processing::build_alert(&self.config, &signal, &entity_results, &priority);
        debug!(
            signal_id = %signal.id,
            alert_id = %alert.id,
            tier = alert.tier.as_str(),
            priority = alert.priority,
            "signal fused"
        );
        self.fused.fetch_add(1, Ordering::Relaxed);
        self.fusion_tx
            .send(alert)
            .await
            .map_err(|_| ProcessingError::ChannelClosed("fusion queue"))?;
        Ok(true)
    }

    // ── Fusion side effects ─────────────────────────────────────────────

    async fn fusion_loop(self: Arc<Self>) {
        let receiver = {
            let mut guard = self.fusion_rx.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };
        let Some(mut rx) = receiver else {
            warn!("fusion loop already consumed the fusion receiver");
            return;
        };

        while let Some(alert) = rx.recv().await {
            // Four independent side effects; one failing or lagging never
            // blocks the others from being attempted.
            let (routed, sync_results, _, _) = tokio::join!(
                async { self.router.route(&alert) },
                self.knowledge_graph.sync_intelligence(&alert),
                self.broadcast(&alert),
                self.audit.log_action(
                    "alert_fused",
                    json!({
                        "alert_id": alert.id,
                        "tier": alert.tier.as_str(),
                        "priority": alert.priority,
                        "sources": alert.source_signal_ids,
                    }),
                ),
            );

            for result in sync_results.iter().filter(|r| !r.success) {
                warn!(
                    alert_id = %alert.id,
                    target = %result.target,
                    "knowledge graph sync failed"
                );
            }
            debug!(
                alert_id = %alert.id,
                destinations = routed.len(),
                "fusion side effects dispatched"
            );
        }
    }

    /// Best-effort broadcast: send-or-drop per subscriber, dead
    /// connections pruned silently.
    async fn broadcast(&self, alert: &FusedAlert) {
        let frame = BroadcastFrame::from_alert(alert);
        let mut subscribers = self.lock_subscribers();
        subscribers.retain(|tx| match tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, RunState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::Sender<BroadcastFrame>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
