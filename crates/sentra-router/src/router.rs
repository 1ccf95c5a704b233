//! The alerts router: destination resolution, bounded delivery pool,
//! timeout + fixed-delay retry, acknowledgment, expiry sweep.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use sentra_core::config::defaults::{
    DELIVERY_LATENCY_EMA_NEW_WEIGHT, DELIVERY_LATENCY_EMA_OLD_WEIGHT, DELIVERY_WORKER_CAP,
};
use sentra_core::config::RouterConfig;
use sentra_core::errors::{DeliveryError, RoutingError};
use sentra_core::models::{DeliveryStatus, FusedAlert, RoutedAlert};
use sentra_core::traits::DeliveryHandler;

use crate::advisory;

/// Counters snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterMetrics {
    pub routed: u64,
    pub delivered: u64,
    pub failed: u64,
    pub retried: u64,
    pub expired: u64,
    pub tracked: usize,
    pub per_destination: HashMap<String, u64>,
    pub per_tier: HashMap<String, u64>,
    pub ema_latency_ms: HashMap<String, f64>,
}

/// Routes fused alerts to destinations with a bounded worker pool.
///
/// Routed alerts live in an in-memory map for the life of the process;
/// only the explicit `expire_stale` sweep evicts. Routed and
/// per-destination counters increment at queue time, not delivery time.
pub struct AlertRouter {
    config: RouterConfig,
    handlers: DashMap<String, Arc<dyn DeliveryHandler>>,
    pending: DashMap<String, RoutedAlert>,
    queue_tx: mpsc::Sender<String>,
    queue_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<String>>>,
    running: AtomicBool,
    routed: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
    expired: AtomicU64,
    per_destination: DashMap<String, u64>,
    per_tier: DashMap<String, u64>,
    ema_latency_ms: DashMap<String, f64>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AlertRouter {
    pub fn new(config: RouterConfig) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(config.delivery_queue_size.max(1));
        Self {
            config,
            handlers: DashMap::new(),
            pending: DashMap::new(),
            queue_tx,
            queue_rx: Arc::new(tokio::sync::Mutex::new(queue_rx)),
            running: AtomicBool::new(false),
            routed: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            retried: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            per_destination: DashMap::new(),
            per_tier: DashMap::new(),
            ema_latency_ms: DashMap::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn register_handler(
        &self,
        destination: impl Into<String>,
        handler: Arc<dyn DeliveryHandler>,
    ) {
        self.handlers.insert(destination.into(), handler);
    }

    // ── Routing ─────────────────────────────────────────────────────────

    /// Resolve the destination set and queue one routed alert per
    /// destination. A destination whose enqueue hits the bounded queue's
    /// capacity gets a Failed record immediately; nothing is silently
    /// dropped.
    pub fn route(&self, alert: &FusedAlert) -> Vec<RoutedAlert> {
        let destinations = self.resolve_destinations(alert);
        let mut results = Vec::with_capacity(destinations.len());

        for destination in destinations {
            let mut routed = RoutedAlert::for_destination(alert, &destination);

            self.routed.fetch_add(1, Ordering::Relaxed);
            *self.per_destination.entry(destination.clone()).or_insert(0) += 1;
            *self
                .per_tier
                .entry(alert.tier.as_str().to_string())
                .or_insert(0) += 1;

            match self.queue_tx.try_send(routed.id.clone()) {
                Ok(()) => {
                    debug!(
                        alert_id = %alert.id,
                        destination = %destination,
                        routed_id = %routed.id,
                        "alert queued for delivery"
                    );
                }
                Err(_) => {
                    routed.status = DeliveryStatus::Failed;
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        alert_id = %alert.id,
                        destination = %destination,
                        "delivery queue full, routed alert marked failed"
                    );
                }
            }
            self.pending.insert(routed.id.clone(), routed.clone());
            results.push(routed);
        }
        results
    }

    /// Tier table ∪ the alert's explicit destinations ∪ configured
    /// defaults, order-preserving dedup, minus disabled destinations.
    fn resolve_destinations(&self, alert: &FusedAlert) -> Vec<String> {
        let mut destinations: Vec<String> = Vec::new();
        let mut push = |dest: &String, out: &mut Vec<String>| {
            if !out.contains(dest) && !self.config.disabled_destinations.contains(dest) {
                out.push(dest.clone());
            }
        };

        if let Some(tier_dests) = self.config.tier_destinations.get(&alert.tier) {
            for dest in tier_dests {
                push(dest, &mut destinations);
            }
        }
        for dest in &alert.routing_destinations {
            push(dest, &mut destinations);
        }
        for dest in &self.config.default_destinations {
            push(dest, &mut destinations);
        }
        destinations
    }

    // ── Acknowledgment & expiry ─────────────────────────────────────────

    /// Transition to Acknowledged regardless of delivery outcome.
    pub fn acknowledge_alert(&self, routed_id: &str, user: &str) -> Result<(), RoutingError> {
        match self.pending.get_mut(routed_id) {
            Some(mut entry) => {
                entry.status = DeliveryStatus::Acknowledged;
                entry.acknowledged_by = Some(user.to_string());
                info!(routed_id = %routed_id, user = %user, "alert acknowledged");
                Ok(())
            }
            None => Err(RoutingError::UnknownAlert(routed_id.to_string())),
        }
    }

    /// Manual sweep: evict terminal (Acknowledged/Expired) entries, then
    /// transition Pending entries older than `max_age` to Expired. Returns
    /// how many expired. Never runs automatically.
    pub fn expire_stale(&self, max_age: chrono::Duration) -> usize {
        self.pending.retain(|_, alert| {
            !matches!(
                alert.status,
                DeliveryStatus::Acknowledged | DeliveryStatus::Expired
            )
        });

        let cutoff = Utc::now() - max_age;
        let mut count = 0usize;
        for mut entry in self.pending.iter_mut() {
            if entry.status == DeliveryStatus::Pending && entry.created_at < cutoff {
                entry.status = DeliveryStatus::Expired;
                count += 1;
            }
        }
        self.expired.fetch_add(count as u64, Ordering::Relaxed);
        count
    }

    pub fn routed_alert(&self, routed_id: &str) -> Option<RoutedAlert> {
        self.pending.get(routed_id).map(|a| a.clone())
    }

    pub fn tracked_count(&self) -> usize {
        self.pending.len()
    }

    // ── Delivery pool ───────────────────────────────────────────────────

    /// Spawn `min(4, max_concurrent_deliveries)` delivery workers.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let worker_count = self
            .config
            .max_concurrent_deliveries
            .min(DELIVERY_WORKER_CAP)
            .max(1);
        let mut tasks = self.lock_tasks();
        for worker_idx in 0..worker_count {
            let router = Arc::clone(self);
            tasks.push(tokio::spawn(async move {
                router.delivery_loop(worker_idx).await;
            }));
        }
        info!(workers = worker_count, "alert router started");
    }

    /// Cancel the delivery pool; queued deliveries are abandoned.
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
        info!("alert router stopped");
    }

    async fn delivery_loop(self: Arc<Self>, worker_idx: usize) {
        let poll = Duration::from_millis(50);
        debug!(worker = worker_idx, "delivery worker started");
        loop {
            if !self.running.load(Ordering::Acquire) {
                break;
            }
            let next = {
                let mut rx = self.queue_rx.lock().await;
                tokio::time::timeout(poll, rx.recv()).await
            };
            match next {
                Ok(Some(routed_id)) => self.deliver_one(&routed_id).await,
                Ok(None) => break,
                Err(_) => continue,
            }
        }
    }

    async fn deliver_one(&self, routed_id: &str) {
        let Some(mut snapshot) = self.routed_alert(routed_id) else {
            return;
        };

        if self.config.advisory_destinations.contains(&snapshot.destination)
            && advisory::qualifies(&snapshot.categories)
        {
            let bulletin = advisory::build_advisory(&snapshot);
            snapshot.advisory = Some(bulletin.clone());
            if let Some(mut entry) = self.pending.get_mut(routed_id) {
                entry.advisory = Some(bulletin);
            }
        }

        let handler = self
            .handlers
            .get(&snapshot.destination)
            .map(|h| h.value().clone());
        let timeout = Duration::from_secs(self.config.delivery_timeout_secs);
        let started = Instant::now();

        let outcome: Result<(), DeliveryError> = match handler {
            None => Err(DeliveryError::NoHandler(snapshot.destination.clone())),
            Some(handler) => {
                match tokio::time::timeout(timeout, handler.deliver(&snapshot)).await {
                    Ok(result) => result,
                    Err(_) => Err(DeliveryError::Timeout {
                        destination: snapshot.destination.clone(),
                        secs: self.config.delivery_timeout_secs,
                    }),
                }
            }
        };

        match outcome {
            Ok(()) => self.on_delivered(routed_id, &snapshot.destination, started.elapsed()),
            Err(error) => self.on_failed(routed_id, error).await,
        }
    }

    fn on_delivered(&self, routed_id: &str, destination: &str, elapsed: Duration) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        if let Some(mut entry) = self.pending.get_mut(routed_id) {
            // Acknowledgment outranks delivery bookkeeping.
            if entry.status != DeliveryStatus::Acknowledged {
                entry.status = DeliveryStatus::Delivered;
            }
            entry.delivered_at = Some(Utc::now());
        }

        let sample_ms = elapsed.as_secs_f64() * 1_000.0;
        let mut ema = self
            .ema_latency_ms
            .entry(destination.to_string())
            .or_insert(sample_ms);
        *ema = *ema * DELIVERY_LATENCY_EMA_OLD_WEIGHT + sample_ms * DELIVERY_LATENCY_EMA_NEW_WEIGHT;

        debug!(routed_id = %routed_id, destination = %destination, "alert delivered");
    }

    async fn on_failed(&self, routed_id: &str, error: DeliveryError) {
        let retry = {
            let Some(mut entry) = self.pending.get_mut(routed_id) else {
                return;
            };
            if entry.status != DeliveryStatus::Acknowledged {
                entry.status = DeliveryStatus::Failed;
            }
            if entry.retry_count < self.config.retry_attempts {
                entry.retry_count += 1;
                true
            } else {
                false
            }
        };

        if retry {
            self.retried.fetch_add(1, Ordering::Relaxed);
            let tx = self.queue_tx.clone();
            let id = routed_id.to_string();
            let delay = Duration::from_secs(self.config.retry_delay_secs);
            debug!(routed_id = %routed_id, error = %error, "delivery failed, retry scheduled");
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if tx.send(id).await.is_err() {
                    warn!("retry re-enqueue failed, delivery queue closed");
                }
            });
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
            warn!(routed_id = %routed_id, error = %error, "delivery retries exhausted");
        }
    }

    pub fn metrics(&self) -> RouterMetrics {
        RouterMetrics {
            routed: self.routed.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            tracked: self.pending.len(),
            per_destination: self
                .per_destination
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
            per_tier: self
                .per_tier
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
            ema_latency_ms: self
                .ema_latency_ms
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
        }
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for AlertRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}
