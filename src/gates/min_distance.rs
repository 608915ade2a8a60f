// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Cooldown throttle: enforces a minimum time between two requests from
//! the same client.

use crate::config::MinRequestDistanceConfig;
use crate::cooldown::CooldownCache;
use crate::gate::Gate;
use crate::statistics::ClientStatisticsTable;
use std::sync::Arc;
use std::time::Duration;

/// Marker key prefix; one marker per client id, shared by every instance
/// using the same cache.
const MARKER_PREFIX: &str = "last-request-";

/// Admits exactly one request per client per window.
///
/// The first request from a client sets a "recently seen" marker that
/// expires after the configured window; any request arriving while the
/// marker is live is denied. No counter is kept, only the marker.
#[derive(Debug, Clone)]
pub struct MinimumRequestTimeDistance {
    window: Duration,
    name: String,
    message: String,
    cooldowns: Arc<CooldownCache>,
}

impl MinimumRequestTimeDistance {
    pub fn new(config: &MinRequestDistanceConfig, cooldowns: Arc<CooldownCache>) -> Self {
        Self {
            window: config.window(),
            name: config.name.clone(),
            message: config.message.clone(),
            cooldowns,
        }
    }

    /// Informational throttle name.
    pub fn throttle_name(&self) -> &str {
        &self.name
    }

    /// Message for throttled clients, with `{n}` expanded to the window
    /// length in seconds.
    pub fn message(&self) -> String {
        self.message
            .replace("{n}", &self.window.as_secs().to_string())
    }
}

impl Gate for MinimumRequestTimeDistance {
    fn name(&self) -> &'static str {
        "MinimumRequestTimeDistance"
    }

    fn statistics_gate(&self, client_id: &str, _statistics: &ClientStatisticsTable) -> bool {
        // no client id - nothing to do...
        if client_id.is_empty() {
            return true;
        }

        let key = format!("{MARKER_PREFIX}{client_id}");
        self.cooldowns.try_acquire(&key, self.window)
    }

    fn block_message(&self) -> Option<String> {
        if self.message.is_empty() {
            None
        } else {
            Some(self.message())
        }
    }
}
