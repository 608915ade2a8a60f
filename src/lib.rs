// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request Gates
//!
//! Per-client admission gates for web request pipelines:
//!
//! - Fast-request protection (average-rate throttle per client)
//! - Minimum inter-request time distance (cooldown throttle)
//! - Landmine honeypot field with timed lockout
//! - An OTP second-factor check sharing the same pluggable contract
//!
//! The core is framework-neutral: an adapter copies the relevant request
//! data into a [`RequestInfo`], a [`GateKeeper`] extracts one client id
//! per configured extractor and runs the bound [`Gate`], and the
//! resulting [`GateDecision`] tells the adapter whether to pass the
//! request on or answer with a block response. All shared state
//! (statistics tables, cooldown markers) is injected rather than global,
//! so tests run against isolated instances while a process typically
//! shares one [`StatisticsRegistry`] and one [`CooldownCache`].

pub mod config;
pub mod cooldown;
pub mod extractor;
pub mod gate;
pub mod gates;
pub mod handlers;
pub mod otp;
pub mod request;
pub mod statistics;

pub use config::Config;
pub use cooldown::CooldownCache;
pub use extractor::IdExtractor;
pub use gate::{ContextProcessor, Gate, GateDecision, GateKeeper};
pub use gates::{FastRequestsProtection, Landmine, MinimumRequestTimeDistance};
pub use otp::{OtpCheck, OtpError, OtpResponse, OtpStatus, OtpVerifier, UserMapping};
pub use request::{RequestArea, RequestInfo};
pub use statistics::{ClientStatistic, ClientStatisticsTable, StatisticsRegistry};
