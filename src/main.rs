// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request Gates Service
//!
//! Runs the gate pipeline in front of a web endpoint, either as an
//! external auth service a reverse proxy consults via `/check`, or as a
//! direct filter answering blocked clients itself.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables over the built-in
//! defaults:
//!
//! - `BIND_ADDR`: server bind address (default: 0.0.0.0:8080)
//! - `REQUESTS_PER_SECOND`: per-client rate threshold (default: 0)
//! - `RETENTION_MS`: statistics retention in milliseconds (default: 3000)
//! - `MIN_DISTANCE_SECS`: cooldown window in seconds (default: 1)
//! - `LANDMINE_SECONDS`: lockout after a tripped mine (default: 120)
//! - `FAULT_ACTION`: redirect target for blocked clients (default: none)

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use request_gates::{
    config::Config,
    cooldown::CooldownCache,
    gate::GateKeeper,
    gates::{FastRequestsProtection, Landmine, MinimumRequestTimeDistance},
    handlers::{check, filter, health, AppState},
    statistics::StatisticsRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        requests_per_second = config.gates.fast_requests.requests_per_second_and_client,
        retention_ms = config.gates.fast_requests.max_retention_time_of_statistics_ms,
        min_distance_secs = config.gates.min_request_distance.seconds,
        landmine_seconds = config.gates.landmine.seconds,
        "starting gate service"
    );

    // Shared gate state: one registry and one marker cache per process.
    let registry = StatisticsRegistry::new();
    let cooldowns = Arc::new(CooldownCache::new());
    let extractors = config.gates.extractors.clone();

    let fast_requests = keeper(
        FastRequestsProtection::new(&config.gates.fast_requests),
        &registry,
        &extractors,
        &config,
    );
    let min_distance = keeper(
        MinimumRequestTimeDistance::new(&config.gates.min_request_distance, cooldowns.clone()),
        &registry,
        &extractors,
        &config,
    );
    let landmine = keeper(
        Landmine::new(&config.gates.landmine, cooldowns.clone()),
        &registry,
        &extractors,
        &config,
    );

    let state = Arc::new(AppState {
        fast_requests,
        min_distance,
        landmine,
    });

    // Purge dead cooldown markers periodically; expiry itself is logical,
    // this only bounds memory.
    let purge_cache = cooldowns.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            purge_cache.purge_expired();
        }
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/check", post(check))
        .route("/filter", post(filter).get(filter))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn keeper<G: request_gates::Gate>(
    gate: G,
    registry: &StatisticsRegistry,
    extractors: &[request_gates::IdExtractor],
    config: &Config,
) -> GateKeeper<G> {
    let keeper = GateKeeper::with_extractors(gate, registry, extractors);
    match &config.gates.fault_action {
        Some(action) => keeper.with_fault_action(action.clone()),
        None => keeper,
    }
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    let mut config = Config::default();
    if let Ok(addr) = std::env::var("BIND_ADDR") {
        config.bind_addr = addr;
    }
    if let Some(value) = env_parse("REQUESTS_PER_SECOND") {
        config.gates.fast_requests.requests_per_second_and_client = value;
    }
    if let Some(value) = env_parse("RETENTION_MS") {
        config.gates.fast_requests.max_retention_time_of_statistics_ms = value;
    }
    if let Some(value) = env_parse("MIN_DISTANCE_SECS") {
        config.gates.min_request_distance.seconds = value;
    }
    if let Some(value) = env_parse("LANDMINE_SECONDS") {
        config.gates.landmine.seconds = value;
    }
    if let Ok(action) = std::env::var("FAULT_ACTION") {
        config.gates.fault_action = Some(action);
    }
    config
}

fn env_parse(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}
