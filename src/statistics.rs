// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-client request statistics.
//!
//! One [`ClientStatistic`] tracks a single client's activity as seen by
//! one extractor. All statistics for one extractor kind live in a shared
//! [`ClientStatisticsTable`]; the [`StatisticsRegistry`] hands out one
//! table per extractor kind so independently constructed gates enforce a
//! single shared counter per client.

use crate::extractor::IdExtractor;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters and timestamps for one client.
#[derive(Debug, Clone)]
pub struct ClientStatistic {
    first_request: Instant,
    last_request: Instant,
    request_count: u64,
}

impl ClientStatistic {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            first_request: now,
            last_request: now,
            request_count: 0,
        }
    }

    /// Record one more request from this client.
    pub fn increase_request_count(&mut self) {
        self.last_request = Instant::now();
        self.request_count += 1;
    }

    pub fn first_request(&self) -> Instant {
        self.first_request
    }

    pub fn last_request(&self) -> Instant {
        self.last_request
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Average request rate over the whole observed window.
    ///
    /// Within the first second this is the raw request count; afterwards
    /// it is `count * 1000 / elapsed_ms` with integer division. The rate
    /// is averaged since the first request, not over a sliding window, so
    /// a client that bursts and then idles dilutes its own average. Known
    /// property, kept for compatibility.
    pub fn requests_per_second(&self) -> u64 {
        let elapsed_ms = self
            .last_request
            .duration_since(self.first_request)
            .as_millis() as u64;
        if elapsed_ms <= 1000 {
            self.request_count
        } else {
            self.request_count * 1000 / elapsed_ms
        }
    }
}

impl Default for ClientStatistic {
    fn default() -> Self {
        Self::new()
    }
}

/// Concurrent client-id → statistic map for one extractor kind.
///
/// `record_request` is atomic per client id: concurrent first requests
/// from a brand-new client converge on a single statistic, and concurrent
/// increments never lose updates (the entry guard is held across the
/// mutation).
#[derive(Debug, Default)]
pub struct ClientStatisticsTable {
    entries: DashMap<String, ClientStatistic>,
}

impl ClientStatisticsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the client's statistic, count this request and
    /// return the resulting average rate.
    pub fn record_request(&self, client_id: &str) -> u64 {
        let mut entry = self
            .entries
            .entry(client_id.to_string())
            .or_insert_with(ClientStatistic::new);
        entry.increase_request_count();
        entry.requests_per_second()
    }

    /// Drop every statistic whose last request is older than `retention`.
    ///
    /// Runs inline on the calling thread; cleanup cost is amortized across
    /// the requests that trigger it instead of needing a timer.
    pub fn sweep_stale(&self, retention: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, statistic| now.duration_since(statistic.last_request()) <= retention);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of one client's statistic, if present.
    pub fn get(&self, client_id: &str) -> Option<ClientStatistic> {
        self.entries.get(client_id).map(|entry| entry.clone())
    }
}

/// One shared statistics table per extractor kind.
///
/// Gates receive the registry at construction instead of reaching for a
/// process-global, so tests run against isolated instances while the
/// service shares a single registry across all gate instances.
#[derive(Debug, Default)]
pub struct StatisticsRegistry {
    tables: DashMap<IdExtractor, Arc<ClientStatisticsTable>>,
}

impl StatisticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared table for the given extractor kind, created on first use.
    pub fn table_for(&self, extractor: IdExtractor) -> Arc<ClientStatisticsTable> {
        self.tables
            .entry(extractor)
            .or_insert_with(|| Arc::new(ClientStatisticsTable::new()))
            .clone()
    }
}
