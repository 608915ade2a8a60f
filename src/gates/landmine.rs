// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Honeypot trap: a hidden field that looks like an easy target. A
//! legitimate client round-trips it unmodified; whoever mutates or drops
//! it earns a timed lockout.

use crate::config::LandmineConfig;
use crate::cooldown::CooldownCache;
use crate::gate::Gate;
use crate::request::{RequestArea, RequestInfo};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Lockout key prefix; keyed by client id only, so every landmine in the
/// process shares lockout state through a common cache.
const MARKER_PREFIX: &str = "landmined-";

/// Denies and locks out clients that tamper with the honeypot field.
#[derive(Debug, Clone)]
pub struct Landmine {
    field_name: String,
    expected_value: String,
    lockout: Duration,
    request_area: RequestArea,
    cooldowns: Arc<CooldownCache>,
}

impl Landmine {
    pub fn new(config: &LandmineConfig, cooldowns: Arc<CooldownCache>) -> Self {
        Self {
            field_name: config.name.clone(),
            expected_value: config.expected_value.clone(),
            lockout: config.lockout(),
            request_area: config.request_area,
            cooldowns,
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn expected_value(&self) -> &str {
        &self.expected_value
    }
}

impl Gate for Landmine {
    fn name(&self) -> &'static str {
        "Landmine"
    }

    fn request_gate(&self, client_id: &str, request: &RequestInfo) -> bool {
        // no client id - nothing to do...
        if client_id.is_empty() {
            return true;
        }

        let key = format!("{MARKER_PREFIX}{client_id}");
        if self.cooldowns.is_locked(&key) {
            return false;
        }

        // An unknown area yields no value, which mismatches below: the
        // gate fails closed rather than erroring.
        let current = request.lookup(self.request_area, &self.field_name);
        if current == Some(self.expected_value.as_str()) {
            return true;
        }

        warn!(
            client_id = %client_id,
            field = %self.field_name,
            lockout_secs = self.lockout.as_secs(),
            "landmine tripped, locking client out"
        );
        self.cooldowns.lock(&key, self.lockout);
        false
    }
}
