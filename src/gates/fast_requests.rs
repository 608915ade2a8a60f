// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Count/rate throttle: blocks clients whose average request rate
//! exceeds a configured per-client threshold.

use crate::config::FastRequestsConfig;
use crate::gate::Gate;
use crate::statistics::ClientStatisticsTable;
use std::time::Duration;
use tracing::debug;

/// Protects a route against multiple fast requests from a single client.
///
/// The rate is averaged since the client was first seen (see
/// [`ClientStatistic::requests_per_second`]), so a burst followed by a
/// pause reads as admissible again once enough wall-clock time has
/// elapsed. That smoothing is part of the contract.
///
/// [`ClientStatistic::requests_per_second`]: crate::statistics::ClientStatistic::requests_per_second
#[derive(Debug, Clone)]
pub struct FastRequestsProtection {
    requests_per_second_and_client: u64,
    retention: Duration,
}

impl FastRequestsProtection {
    pub fn new(config: &FastRequestsConfig) -> Self {
        Self {
            requests_per_second_and_client: config.requests_per_second_and_client,
            retention: config.retention(),
        }
    }

    /// Requests per second one client may issue.
    pub fn requests_per_second_and_client(&self) -> u64 {
        self.requests_per_second_and_client
    }

    /// How long a silent client's statistic is retained.
    pub fn retention(&self) -> Duration {
        self.retention
    }
}

impl Default for FastRequestsProtection {
    fn default() -> Self {
        Self::new(&FastRequestsConfig::default())
    }
}

impl Gate for FastRequestsProtection {
    fn name(&self) -> &'static str {
        "FastRequestsProtection"
    }

    fn statistics_gate(&self, client_id: &str, statistics: &ClientStatisticsTable) -> bool {
        // no client id - nothing to do...
        if client_id.is_empty() {
            return true;
        }

        // Forget clients that are slower than one request per retention
        // window. The scan runs inline on whichever request triggers it.
        statistics.sweep_stale(self.retention);

        let requests_per_second = statistics.record_request(client_id);
        debug!(
            client_id = %client_id,
            requests_per_second,
            threshold = self.requests_per_second_and_client,
            "client statistic updated"
        );
        requests_per_second <= self.requests_per_second_and_client
    }
}
