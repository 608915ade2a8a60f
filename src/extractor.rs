// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client identity extraction.
//!
//! An extractor derives a client identity string from a request snapshot.
//! Extraction never fails; when the request carries no usable identity the
//! result is the empty string, and every gate admits unidentifiable
//! clients without further checks.

use crate::request::RequestInfo;
use serde::{Deserialize, Serialize};

/// The strategies for deriving a per-client identity.
///
/// Each variant also keys the shared statistics table that gates of this
/// extractor consult, so two gates configured with the same variant see
/// the same per-client counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdExtractor {
    /// The framework session identifier, or `""` without a session.
    SessionId,
    /// A composite of the reported remote address and raw proxy headers.
    ///
    /// Any single signal is trivially spoofable; joining the remote
    /// address, the `REMOTE_ADDR` header and the first forwarded-for hop
    /// raises the bar. Still a heuristic, not a security guarantee.
    UserHost,
}

impl IdExtractor {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            IdExtractor::SessionId => "session_id",
            IdExtractor::UserHost => "user_host",
        }
    }

    /// Derive the client id from the request. Absent data yields `""`.
    pub fn extract(&self, request: &RequestInfo) -> String {
        match self {
            IdExtractor::SessionId => request.session_id().unwrap_or_default().to_string(),
            IdExtractor::UserHost => extract_user_host(request),
        }
    }
}

fn extract_user_host(request: &RequestInfo) -> String {
    let remote = request.remote_addr().unwrap_or_default();
    if !request.has_headers() {
        return remote.to_string();
    }

    let reported = request.header("REMOTE_ADDR").unwrap_or_default();
    let forwarded = first_part(request.header("HTTP_X_FORWARDED_FOR").unwrap_or_default());
    format!("{remote}-{reported}-{forwarded}")
}

/// First entry of a comma-separated header value.
fn first_part(value: &str) -> &str {
    value.split(',').next().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_extractor_returns_session() {
        let request = RequestInfo::new().with_session_id("abc123");
        assert_eq!(IdExtractor::SessionId.extract(&request), "abc123");
    }

    #[test]
    fn session_id_extractor_returns_empty_without_session() {
        let request = RequestInfo::new().with_remote_addr("10.0.0.1");
        assert_eq!(IdExtractor::SessionId.extract(&request), "");
    }

    #[test]
    fn user_host_joins_all_signals() {
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
    fn user_host_falls_back_to_remote_addr_without_headers() {
        let request = RequestInfo::new().with_remote_addr("10.0.0.1");
        assert_eq!(IdExtractor::UserHost.extract(&request), "10.0.0.1");
    }

    #[test]
    fn user_host_empty_without_any_request_data() {
        assert_eq!(IdExtractor::UserHost.extract(&RequestInfo::new()), "");
    }

    #[test]
    fn user_host_joins_missing_headers_as_empty_parts() {
        let request = RequestInfo::new()
            .with_remote_addr("10.0.0.1")
            .with_header("Accept", "text/html");
        assert_eq!(IdExtractor::UserHost.extract(&request), "10.0.0.1--");
    }
}
