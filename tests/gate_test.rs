// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Behavioral tests for the gate policies against the public API.

use request_gates::{
    config::{FastRequestsConfig, LandmineConfig, MinRequestDistanceConfig},
    cooldown::CooldownCache,
    extractor::IdExtractor,
    gate::{Gate, GateKeeper},
    gates::{FastRequestsProtection, Landmine, MinimumRequestTimeDistance},
    request::RequestInfo,
    statistics::{ClientStatisticsTable, StatisticsRegistry},
};
use std::sync::Arc;
use std::time::Duration;

fn fast_gate(threshold: u64, retention_ms: u64) -> FastRequestsProtection {
    FastRequestsProtection::new(&FastRequestsConfig {
        requests_per_second_and_client: threshold,
        max_retention_time_of_statistics_ms: retention_ms,
    })
}

fn distance_gate(seconds: u64) -> MinimumRequestTimeDistance {
    MinimumRequestTimeDistance::new(
        &MinRequestDistanceConfig {
            seconds,
            ..Default::default()
        },
        Arc::new(CooldownCache::new()),
    )
}

fn landmine_gate() -> Landmine {
    Landmine::new(&LandmineConfig::default(), Arc::new(CooldownCache::new()))
}

#[test]
fn empty_client_id_bypasses_every_gate() {
    let statistics = ClientStatisticsTable::new();
    let request = RequestInfo::new();

    let fast = fast_gate(0, 3000);
    assert!(fast.statistics_gate("", &statistics));
    assert!(fast.request_gate("", &request));

    let distance = distance_gate(1);
    assert!(distance.statistics_gate("", &statistics));
    assert!(distance.request_gate("", &request));

    let mine = landmine_gate();
    assert!(mine.statistics_gate("", &statistics));
    assert!(mine.request_gate("", &request));
}

#[test]
fn rate_threshold_blocks_the_third_rapid_request() {
    let statistics = ClientStatisticsTable::new();
    let gate = fast_gate(2, 3000);

    assert!(gate.statistics_gate("client", &statistics));
    assert!(gate.statistics_gate("client", &statistics));
    assert!(!gate.statistics_gate("client", &statistics));
}

#[test]
fn independent_gate_instances_share_one_counter() {
    // Two independently constructed keepers over the same registry must
    // enforce the limit as one shared counter.
    let registry = StatisticsRegistry::new();
    let first = GateKeeper::with_extractors(
        fast_gate(2, 3000),
        &registry,
        &[IdExtractor::UserHost],
    );
    let second = GateKeeper::with_extractors(
        fast_gate(2, 3000),
        &registry,
        &[IdExtractor::UserHost],
    );

    let request = RequestInfo::new().with_remote_addr("10.0.0.1");
    assert!(first.check(&request).is_admitted());
    assert!(second.check(&request).is_admitted());
    assert!(!first.check(&request).is_admitted());
}

#[tokio::test]
async fn eviction_resets_the_rate_window() {
    let statistics = ClientStatisticsTable::new();
    let gate = fast_gate(2, 50);

    assert!(gate.statistics_gate("client", &statistics));
    assert!(gate.statistics_gate("client", &statistics));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(gate.statistics_gate("client", &statistics));
    assert!(gate.statistics_gate("client", &statistics));
}

#[tokio::test]
async fn cooldown_admits_once_per_window() {
    let statistics = ClientStatisticsTable::new();
    let gate = distance_gate(1);

    assert!(gate.statistics_gate("client", &statistics));
    assert!(!gate.statistics_gate("client", &statistics));
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(gate.statistics_gate("client", &statistics));
}

#[test]
fn cooldown_block_carries_the_configured_message() {
    let registry = StatisticsRegistry::new();
    let gate = MinimumRequestTimeDistance::new(
        &MinRequestDistanceConfig {
            seconds: 2,
            message: "wait {n} seconds before trying again".to_string(),
            ..Default::default()
        },
        Arc::new(CooldownCache::new()),
    );
    let keeper = GateKeeper::with_extractors(gate, &registry, &[IdExtractor::UserHost]);

    let request = RequestInfo::new().with_remote_addr("10.0.0.5");
    assert!(keeper.check(&request).is_admitted());
    match keeper.check(&request) {
        request_gates::GateDecision::Blocked { reason, .. } => {
            assert_eq!(reason.as_deref(), Some("wait 2 seconds before trying again"));
        }
        request_gates::GateDecision::Admitted => panic!("expected the distance gate to close"),
    }
}

#[test]
fn landmine_round_trip_and_lockout() {
    let gate = landmine_gate();

    let intact = RequestInfo::new().with_form_field("Landmine", "8008");
    assert!(gate.request_gate("client", &intact));

    let tampered = RequestInfo::new().with_form_field("Landmine", "1234");
    assert!(!gate.request_gate("client", &tampered));

    // The lockout marker now governs, not the field value.
    assert!(!gate.request_gate("client", &intact));
}

#[test]
fn host_extractor_fallback_chain() {
    let request = RequestInfo::new()
        .with_remote_addr("10.0.0.1")
        .with_header("REMOTE_ADDR", "10.0.0.2")
        .with_header("HTTP_X_FORWARDED_FOR", "10.0.0.3,10.0.0.4");
    assert_eq!(
        IdExtractor::UserHost.extract(&request),
        "10.0.0.1-10.0.0.2-10.0.0.3"
    );
}

#[test]
fn concurrent_first_requests_never_lose_updates() {
    let statistics = Arc::new(ClientStatisticsTable::new());
    let gate = Arc::new(fast_gate(u64::MAX, 60_000));
    let threads: u64 = 8;
    let per_thread: u64 = 100;

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let statistics = statistics.clone();
            let gate = gate.clone();
            std::thread::spawn(move || {
                for _ in 0..per_thread {
                    assert!(gate.statistics_gate("brand-new-client", &statistics));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(statistics.len(), 1);
    let statistic = statistics.get("brand-new-client").unwrap();
    assert_eq!(statistic.request_count(), threads * per_thread);
}
