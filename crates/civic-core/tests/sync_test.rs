#![allow(clippy::unwrap_used)]

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use civic_core::{CoreError, DataStore, EntityKind, SyncConfig, SyncService};
use common::{Method, MockGateway, Reply, constituency, counter, mla, paged, party};
use pretty_assertions::assert_eq;

const SECOND: Duration = Duration::from_secs(1);

fn service(gw: &Arc<MockGateway>, store: &Arc<DataStore>, config: SyncConfig) -> SyncService {
    SyncService::new(Arc::clone(store), gw.handle(), config).unwrap()
}

// ── Cycle semantics ──────────────────────────────────────────────────

#[tokio::test]
async fn failed_entity_keeps_its_data_and_spares_siblings() {
    let gw = MockGateway::new();
    gw.respond_list("/constituencies", &[constituency("c1", "North"), constituency("c2", "South")]);
    gw.respond(Method::Get, "/mlas", Reply::Http(503, "upstream down".into()));

    let store = Arc::new(DataStore::new());
    store.set_mlas(vec![mla("m0", "c1", "p1")]);

    let errors: Arc<Mutex<Vec<(EntityKind, String)>>> = Arc::default();
    let errors_in = Arc::clone(&errors);
    let config = SyncConfig::default()
        .with_entities([EntityKind::Constituencies, EntityKind::Mlas])
        .on_error(move |kind, e| errors_in.lock().unwrap().push((kind, e.to_string())));
    let sync = service(&gw, &store, config);

    let report = sync.sync_now().await;

    assert_eq!(report.succeeded, vec![EntityKind::Constituencies]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(store.constituencies().len(), 2);
    let mlas = store.mlas();
    assert_eq!(mlas.len(), 1);
    assert_eq!(mlas[0].id, "m0");

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, EntityKind::Mlas);
    assert!(errors[0].1.contains("upstream down"));
    assert_eq!(
        store.error(EntityKind::Mlas).as_deref(),
        Some("Server error: upstream down")
    );
    assert_eq!(store.error(EntityKind::Constituencies), None);
}

#[tokio::test]
async fn logical_failure_uses_server_message() {
    let gw = MockGateway::new();
    gw.respond(Method::Get, "/parties", Reply::Rejected("Parties are being migrated".into()));
    let store = Arc::new(DataStore::new());
    let sync = service(&gw, &store, SyncConfig::default());

    let err = sync.sync_parties_now().await.unwrap_err();
    assert!(matches!(err, CoreError::Rejected { .. }));
    assert_eq!(
        store.error(EntityKind::Parties).as_deref(),
        Some("Parties are being migrated")
    );
}

#[tokio::test]
async fn success_callback_fires_per_entity() {
    let gw = MockGateway::new();
    gw.respond_list("/parties", &[party("p1")]);
    gw.respond(
        Method::Get,
        "/dashboard/stats",
        Reply::Data(serde_json::json!({ "total_mlas": 3, "active_mlas": 2 })),
    );
    let store = Arc::new(DataStore::new());
    let seen: Arc<Mutex<Vec<EntityKind>>> = Arc::default();
    let seen_in = Arc::clone(&seen);
    let config = SyncConfig::default()
        .with_entities([EntityKind::Parties, EntityKind::DashboardStats])
        .on_success(move |kind| seen_in.lock().unwrap().push(kind));
    let sync = service(&gw, &store, config);

    let report = sync.sync_now().await;
    assert!(report.is_success());

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, vec![EntityKind::Parties, EntityKind::DashboardStats]);
    assert_eq!(store.dashboard_stats().unwrap().active_mlas, 2);
}

#[tokio::test]
async fn manual_sync_of_per_record_stats_is_refused() {
    let gw = MockGateway::new();
    let store = Arc::new(DataStore::new());
    let sync = service(&gw, &store, SyncConfig::default());

    let err = sync.sync_entity_now(EntityKind::MlaStats).await.unwrap_err();
    assert!(matches!(err, CoreError::Config { .. }));
    assert!(gw.calls().is_empty());
}

#[tokio::test]
async fn status_counts_completed_cycles() {
    let gw = MockGateway::new();
    gw.respond_list("/parties", &[party("p1")]);
    let store = Arc::new(DataStore::new());
    let sync = service(
        &gw,
        &store,
        SyncConfig::default().with_entities([EntityKind::Parties]),
    );

    assert_eq!(sync.status().cycles, 0);
    sync.sync_now().await;
    sync.sync_now().await;

    let status = sync.status();
    assert_eq!(status.cycles, 2);
    assert!(status.last_cycle.is_some());
    assert!(!status.running);
    assert_eq!(status.entities, vec![EntityKind::Parties]);
}

// ── Timer lifecycle ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn double_start_runs_a_single_timer() {
    let gw = MockGateway::new();
    gw.respond_list("/parties", &[party("p1")]);
    let store = Arc::new(DataStore::new());
    let sync = service(
        &gw,
        &store,
        SyncConfig::default()
            .with_entities([EntityKind::Parties])
            .with_interval(SECOND),
    );

    sync.start();
    sync.start();
    assert!(sync.is_running());

    // Immediate first cycle.
    tokio::time::sleep(SECOND / 2).await;
    let after_start = gw.call_count(Method::Get, "/parties");
    assert_eq!(after_start, 1);

    tokio::time::sleep(SECOND * 3).await;
    assert_eq!(gw.call_count(Method::Get, "/parties") - after_start, 3);

    sync.stop();
    sync.stop();
    assert!(!sync.is_running());
    tokio::time::sleep(SECOND * 5).await;
    assert_eq!(gw.call_count(Method::Get, "/parties"), 4);
}

#[tokio::test(start_paused = true)]
async fn reconfigure_replaces_the_running_timer() {
    let gw = MockGateway::new();
    gw.respond_list("/parties", &[party("p1")]);
    let store = Arc::new(DataStore::new());
    let base = SyncConfig::default().with_entities([EntityKind::Parties]);
    let sync = service(&gw, &store, base.clone().with_interval(SECOND));

    sync.start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gw.call_count(Method::Get, "/parties"), 1);

    sync.configure(base.with_interval(SECOND * 10)).unwrap();
    assert!(sync.is_running());
    assert_eq!(sync.status().interval, SECOND * 10);

    // New timer: immediate tick, then +10s and +20s. The old 1s timer
    // would have added ~25 more.
    tokio::time::sleep(SECOND * 25).await;
    assert_eq!(gw.call_count(Method::Get, "/parties"), 4);
    sync.stop();
}

#[tokio::test(start_paused = true)]
async fn invalid_reconfigure_keeps_old_config() {
    let gw = MockGateway::new();
    let store = Arc::new(DataStore::new());
    let sync = service(&gw, &store, SyncConfig::default());

    let err = sync
        .configure(SyncConfig::default().with_interval(Duration::ZERO))
        .unwrap_err();
    assert!(matches!(err, CoreError::Config { .. }));
    assert_eq!(sync.status().interval, SyncConfig::default().interval);
}

#[tokio::test(start_paused = true)]
async fn disabled_config_does_not_start() {
    let gw = MockGateway::new();
    let store = Arc::new(DataStore::new());
    let sync = service(
        &gw,
        &store,
        SyncConfig {
            enabled: false,
            ..SyncConfig::default()
        },
    );

    sync.start();
    assert!(!sync.is_running());
    tokio::time::sleep(SECOND * 600).await;
    assert!(gw.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_does_not_abort_an_in_flight_cycle() {
    let gw = MockGateway::new();
    gw.respond_once_after(
        Method::Get,
        "/parties",
        Reply::Data(paged(&[party("p1")])),
        SECOND * 2,
    );
    let store = Arc::new(DataStore::new());
    let sync = service(
        &gw,
        &store,
        SyncConfig::default()
            .with_entities([EntityKind::Parties])
            .with_interval(SECOND * 60),
    );

    sync.start();
    tokio::time::sleep(SECOND).await;
    sync.stop();
    tokio::time::sleep(SECOND * 5).await;

    assert_eq!(store.parties().len(), 1);
    assert_eq!(gw.call_count(Method::Get, "/parties"), 1);
}

// ── Overlapping fetches ──────────────────────────────────────────────

async fn overlapping_party_syncs(reject_stale_results: bool) -> Arc<DataStore> {
    let gw = MockGateway::new();
    gw.respond_once_after(
        Method::Get,
        "/parties",
        Reply::Data(paged(&[party("p-old")])),
        SECOND * 2,
    );
    gw.respond_once_after(
        Method::Get,
        "/parties",
        Reply::Data(paged(&[party("p-new")])),
        Duration::ZERO,
    );
    let store = Arc::new(DataStore::new());
    let sync = service(
        &gw,
        &store,
        SyncConfig {
            reject_stale_results,
            ..SyncConfig::default()
        },
    );

    let slow = sync.clone();
    let first = tokio::spawn(async move { slow.sync_parties_now().await });
    tokio::task::yield_now().await;
    assert_eq!(gw.call_count(Method::Get, "/parties"), 1);

    sync.sync_parties_now().await.unwrap();
    first.await.unwrap().unwrap();
    store
}

#[tokio::test(start_paused = true)]
async fn later_completion_wins_by_default() {
    let store = overlapping_party_syncs(false).await;
    assert_eq!(store.parties()[0].id, "p-old");
}

#[tokio::test(start_paused = true)]
async fn stale_results_can_be_rejected() {
    let store = overlapping_party_syncs(true).await;
    assert_eq!(store.parties()[0].id, "p-new");
}

#[tokio::test]
async fn sync_writes_notify_subscribers_once_per_entity() {
    let gw = MockGateway::new();
    gw.respond_list("/constituencies", &[constituency("c1", "North")]);
    gw.respond_list("/mlas", &[mla("m1", "c1", "p1")]);
    gw.respond_list("/parties", &[party("p1")]);
    let store = Arc::new(DataStore::new());
    let (hits, listener) = counter();
    let _sub = store.subscribe(move |_| listener());
    let sync = service(&gw, &store, SyncConfig::default());

    sync.sync_now().await;
    assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 3);
}
