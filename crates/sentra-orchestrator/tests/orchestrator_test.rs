//! End-to-end orchestrator tests: intake gating, the fusion pipeline,
//! side-effect dispatch, broadcast pruning, and degraded mode.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use sentra_core::config::defaults::DEST_OFFICER_SAFETY;
use sentra_core::config::{OrchestratorConfig, RouterConfig, RulesConfig};
use sentra_core::errors::DeliveryError;
use sentra_core::models::{
    AlertTier, RoutedAlert, Signal, SignalCategory, SignalSource,
};
use sentra_core::traits::{DeliveryHandler, InMemoryAuditLog};
use sentra_correlation::CorrelationEngine;
use sentra_orchestrator::{Orchestrator, RunState};
use sentra_router::AlertRouter;
use sentra_rules::RulesEngine;

struct RecordingHandler {
    seen: Mutex<Vec<RoutedAlert>>,
}

impl RecordingHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self { seen: Mutex::new(Vec::new()) })
    }

    fn seen(&self) -> Vec<RoutedAlert> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryHandler for RecordingHandler {
    async fn deliver(&self, alert: &RoutedAlert) -> Result<(), DeliveryError> {
        self.seen.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        batch_size: 8,
        batch_window_ms: 20,
        ..OrchestratorConfig::default()
    }
}

fn build(
    config: OrchestratorConfig,
) -> (Arc<Orchestrator>, Arc<AlertRouter>, Arc<InMemoryAuditLog>) {
    let correlator = Arc::new(CorrelationEngine::default());
    let rules = Arc::new(RulesEngine::with_default_rules(RulesConfig {
        cache_enabled: false,
        ..RulesConfig::default()
    }));
    let router = Arc::new(AlertRouter::new(RouterConfig::default()));
    let audit = Arc::new(InMemoryAuditLog::new());
    let orchestrator = Arc::new(
        Orchestrator::new(config, correlator, rules, router.clone())
            .with_audit_log(audit.clone()),
    );
    (orchestrator, router, audit)
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..300 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

fn safety_signal() -> Signal {
    Signal::new(SignalSource::OfficerSafety, SignalCategory::Threat, 0.95)
        .with_attributes(json!({
            "entity_id": "officer-12",
            "person": {"name": "Ada Calhoun"},
        }))
}

#[tokio::test]
async fn safety_source_signals_fuse_to_t1_with_safety_destination() {
    let (orchestrator, router, audit) = build(fast_config());
    let safety_channel = RecordingHandler::new();
    router.register_handler(DEST_OFFICER_SAFETY, safety_channel.clone());
    router.start();
    let mut frames = orchestrator.subscribe();
    orchestrator.start();

    assert!(orchestrator.ingest_signal(safety_signal()));

    let frame = tokio::time::timeout(Duration::from_secs(5), frames.recv())
        .await
        .expect("broadcast within deadline")
        .expect("frame");
    // Forced T1 regardless of the rule score.
    assert_eq!(frame.tier, AlertTier::T1);

    wait_until(|| !safety_channel.seen().is_empty()).await;
    let delivered = &safety_channel.seen()[0];
    assert_eq!(delivered.destination, DEST_OFFICER_SAFETY);
    assert_eq!(delivered.tier, AlertTier::T1);

    // The routed metrics and the audit trail both saw the alert.
    assert!(router.metrics().per_destination.contains_key(DEST_OFFICER_SAFETY));
    wait_until(|| !audit.entries().is_empty()).await;
    assert_eq!(audit.entries()[0].action, "alert_fused");

    orchestrator.stop().await;
    router.stop().await;
}

#[tokio::test]
async fn fused_alert_destinations_include_tier_and_source_tables() {
    let (orchestrator, router, _) = build(fast_config());
    router.start();
    let mut frames = orchestrator.subscribe();
    orchestrator.start();

    orchestrator.ingest_signal(safety_signal());
    frames.recv().await.expect("frame");

    wait_until(|| router.metrics().routed > 0).await;
    let metrics = router.metrics();
    // Tier table for T1 plus the officer-safety source addition.
    assert!(metrics.per_destination.contains_key(DEST_OFFICER_SAFETY));
    assert!(metrics.per_destination.contains_key("patrol_bulletin"));

    orchestrator.stop().await;
    router.stop().await;
}

#[tokio::test]
async fn low_signals_stay_below_the_fusion_gate() {
    // The default base score already clears the recall-favoring priority
    // threshold, so raise the bar to expose the gate.
    let config = OrchestratorConfig {
        priority_threshold: 99.0,
        ..fast_config()
    };
    let (orchestrator, _router, _) = build(config);
    let mut frames = orchestrator.subscribe();
    orchestrator.start();

    let signal = Signal::new(SignalSource::TipLine, SignalCategory::Tip, 0.3)
        .with_attributes(json!({"note": "vague sighting"}));
    assert!(orchestrator.ingest_signal(signal));

    wait_until(|| orchestrator.metrics().processed == 1).await;
    assert_eq!(orchestrator.metrics().fused, 0);
    assert!(frames.try_recv().is_err());

    orchestrator.stop().await;
}

struct SlowNormalizer;

impl sentra_core::traits::SignalNormalizer for SlowNormalizer {
    fn normalize(&self, _signal: &mut Signal) {
        std::thread::sleep(Duration::from_millis(300));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn intake_rejects_when_not_running_disabled_or_full() {
    let config = OrchestratorConfig {
        signal_queue_size: 2,
        batch_size: 1,
        batch_window_ms: 10,
        disabled_sources: vec![SignalSource::Osint],
        ..fast_config()
    };
    let (orchestrator, _router, _) = build(config);
    orchestrator.register_normalizer(SignalSource::Dispatch, Arc::new(SlowNormalizer));

    // Not started yet: Initializing rejects.
    assert!(!orchestrator.ingest_signal(safety_signal()));
    assert_eq!(orchestrator.run_state(), RunState::Initializing);

    orchestrator.start();
    assert_eq!(orchestrator.run_state(), RunState::Running);

    // Disabled source rejects.
    assert!(!orchestrator.ingest_signal(Signal::new(
        SignalSource::Osint,
        SignalCategory::Tip,
        0.9
    )));

    // Paused rejects.
    orchestrator.pause();
    assert!(!orchestrator.ingest_signal(safety_signal()));
    orchestrator.resume();

    // Queue capacity: the slow normalizer pins the main loop on the first
    // signal, so the next two fill the queue and the third bounces.
    let dispatch = || Signal::new(SignalSource::Dispatch, SignalCategory::Incident, 0.9);
    assert!(orchestrator.ingest_signal(dispatch()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(orchestrator.ingest_signal(dispatch()));
    assert!(orchestrator.ingest_signal(dispatch()));
    assert!(!orchestrator.ingest_signal(dispatch()));
    assert!(orchestrator.metrics().rejected >= 4);

    orchestrator.stop().await;
    assert!(!orchestrator.ingest_signal(safety_signal()));
}

#[tokio::test]
async fn batch_ingest_reports_per_item_results() {
    let config = OrchestratorConfig {
        disabled_sources: vec![SignalSource::Osint],
        ..fast_config()
    };
    let (orchestrator, _router, _) = build(config);
    orchestrator.start();

    let results = orchestrator.ingest_signals_batch(vec![
        safety_signal(),
        Signal::new(SignalSource::Osint, SignalCategory::Tip, 0.9),
        safety_signal(),
    ]);
    assert_eq!(results, vec![true, false, true]);

    orchestrator.stop().await;
}

#[tokio::test]
async fn repeated_processing_errors_set_the_advisory_degraded_flag() {
    let config = OrchestratorConfig {
        degraded_error_threshold: 2,
        ..fast_config()
    };
    let (orchestrator, _router, _) = build(config);
    orchestrator.start();

    let malformed = |n: u32| {
        let mut signal = Signal::new(SignalSource::Dispatch, SignalCategory::Incident, 0.9);
        signal.attributes = json!(format!("not an object {n}"));
        signal
    };

    assert!(orchestrator.ingest_signal(malformed(1)));
    assert!(orchestrator.ingest_signal(malformed(2)));

    wait_until(|| orchestrator.is_degraded()).await;
    let metrics = orchestrator.metrics();
    assert!(metrics.errors >= 2);

    // Degraded is advisory: intake and processing continue.
    assert!(orchestrator.ingest_signal(safety_signal()));
    wait_until(|| orchestrator.metrics().fused >= 1).await;
    assert!(orchestrator.is_degraded(), "degraded never auto-clears");

    orchestrator.stop().await;
}

#[tokio::test]
async fn dead_broadcast_subscribers_are_pruned_silently() {
    let (orchestrator, _router, _) = build(fast_config());
    let frames = orchestrator.subscribe();
    let mut live = orchestrator.subscribe();
    assert_eq!(orchestrator.metrics().subscribers, 2);
    orchestrator.start();

    drop(frames);
    orchestrator.ingest_signal(safety_signal());
    live.recv().await.expect("live subscriber still served");

    wait_until(|| orchestrator.metrics().subscribers == 1).await;
    orchestrator.stop().await;
}

#[tokio::test]
async fn correlated_signals_carry_their_correlations_into_the_alert() {
    let (orchestrator, router, _) = build(fast_config());
    let dispatch = RecordingHandler::new();
    router.register_handler("dispatch", dispatch.clone());
    router.start();
    orchestrator.start();

    // Two sightings of the same person, each with its own record id; the
    // second correlates against the first on exact, fuzzy, and temporal
    // strategies.
    let sighting = |record_id: &str, minutes: i64| {
        Signal::new(SignalSource::Dispatch, SignalCategory::Threat, 0.95)
            .with_attributes(json!({
                "person": {"id": record_id, "name": "Ada Calhoun", "dob": "1988-02-14"},
            }))
            .with_timestamp(chrono::Utc::now() - chrono::Duration::minutes(minutes))
    };
    orchestrator.ingest_signal(sighting("sighting-1", 30));
    wait_until(|| orchestrator.metrics().processed >= 1).await;
    orchestrator.ingest_signal(sighting("sighting-2", 0));

    wait_until(|| {
        dispatch.seen().iter().any(|alert| {
            alert.payload["summary"]
                .as_str()
                .is_some_and(|s| s.contains("3 correlation(s)"))
        })
    })
    .await;

    orchestrator.stop().await;
    router.stop().await;
}
