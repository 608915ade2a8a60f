// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the gate service.
//!
//! Defaults match the original gate semantics: an unconfigured request
//! rate of 0 blocks every identified client, statistics are retained for
//! 3 seconds, the minimum request distance is 1 second, and a triggered
//! landmine locks a client out for 120 seconds.

use crate::extractor::IdExtractor;
use crate::otp::UserMapping;
use crate::request::RequestArea;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Gate pipeline configuration
    #[serde(default)]
    pub gates: GatesConfig,

    /// OTP second-factor check configuration
    #[serde(default)]
    pub otp: OtpConfig,
}

/// Configuration shared by the whole gate pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatesConfig {
    /// Extractors to derive client ids with (default: session id + user host)
    #[serde(default = "default_extractors")]
    pub extractors: Vec<IdExtractor>,

    /// Action to redirect blocked clients to; without it they receive the
    /// fixed block body with HTTP 409 (default: none)
    #[serde(default)]
    pub fault_action: Option<String>,

    /// Fast-request protection
    #[serde(default)]
    pub fast_requests: FastRequestsConfig,

    /// Minimum inter-request distance
    #[serde(default)]
    pub min_request_distance: MinRequestDistanceConfig,

    /// Honeypot landmine
    #[serde(default)]
    pub landmine: LandmineConfig,
}

/// Count/rate throttle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastRequestsConfig {
    /// Requests per second one client may issue; 0 blocks every
    /// identified client until configured (default: 0)
    #[serde(default)]
    pub requests_per_second_and_client: u64,

    /// Statistics retention in milliseconds; clients silent for longer
    /// are forgotten (default: 3000)
    #[serde(default = "default_retention_ms")]
    pub max_retention_time_of_statistics_ms: u64,
}

/// Cooldown throttle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinRequestDistanceConfig {
    /// Seconds a client must wait between admitted requests (default: 1)
    #[serde(default = "default_min_distance_secs")]
    pub seconds: u64,

    /// Informational name for this throttle (default: empty)
    #[serde(default)]
    pub name: String,

    /// Message sent to throttled clients; `{n}` expands to `seconds`
    /// (default: empty)
    #[serde(default)]
    pub message: String,
}

/// Honeypot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmineConfig {
    /// Name of the honeypot field (default: "Landmine")
    #[serde(default = "default_landmine_name")]
    pub name: String,

    /// Value a legitimate client round-trips unmodified (default: "8008")
    #[serde(default = "default_landmine_value")]
    pub expected_value: String,

    /// Lockout in seconds after the mine is tripped (default: 120)
    #[serde(default = "default_landmine_seconds")]
    pub seconds: u64,

    /// Where to read the field from (default: form)
    #[serde(default)]
    pub request_area: RequestArea,
}

/// OTP second-factor check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    /// Form field carrying the one-time password (default: "otp")
    #[serde(default = "default_otp_field")]
    pub field_name: String,

    /// Accept any mapped token regardless of the current principal's
    /// name (default: false)
    #[serde(default)]
    pub skip_identity_name_check: bool,

    /// Token-id → user-name mapping table. Absent means misconfigured;
    /// the check fails with a configuration error, not an
    /// authentication failure (default: none)
    #[serde(default)]
    pub users: Option<Vec<UserMapping>>,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_extractors() -> Vec<IdExtractor> {
    vec![IdExtractor::SessionId, IdExtractor::UserHost]
}

fn default_retention_ms() -> u64 {
    3000
}

fn default_min_distance_secs() -> u64 {
    1
}

fn default_landmine_name() -> String {
    "Landmine".to_string()
}

fn default_landmine_value() -> String {
    "8008".to_string()
}

fn default_landmine_seconds() -> u64 {
    120
}

fn default_otp_field() -> String {
    "otp".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            gates: GatesConfig::default(),
            otp: OtpConfig::default(),
        }
    }
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            extractors: default_extractors(),
            fault_action: None,
            fast_requests: FastRequestsConfig::default(),
            min_request_distance: MinRequestDistanceConfig::default(),
            landmine: LandmineConfig::default(),
        }
    }
}

impl Default for FastRequestsConfig {
    fn default() -> Self {
        Self {
            requests_per_second_and_client: 0,
            max_retention_time_of_statistics_ms: default_retention_ms(),
        }
    }
}

impl Default for MinRequestDistanceConfig {
    fn default() -> Self {
        Self {
            seconds: default_min_distance_secs(),
            name: String::new(),
            message: String::new(),
        }
    }
}

impl Default for LandmineConfig {
    fn default() -> Self {
        Self {
            name: default_landmine_name(),
            expected_value: default_landmine_value(),
            seconds: default_landmine_seconds(),
            request_area: RequestArea::Form,
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            field_name: default_otp_field(),
            skip_identity_name_check: false,
            users: None,
        }
    }
}

impl FastRequestsConfig {
    /// Get the statistics retention duration
    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.max_retention_time_of_statistics_ms)
    }
}

impl MinRequestDistanceConfig {
    /// Get the cooldown window duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}

impl LandmineConfig {
    /// Get the lockout duration
    pub fn lockout(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}
