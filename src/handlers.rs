// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP adapter for the gate pipeline.
//!
//! Two modes, mirroring how the service can be deployed:
//!
//! 1. **External auth service**: a reverse proxy posts the request
//!    metadata to `/check` and reads the admit/deny decision from the
//!    JSON body.
//!
//! 2. **Direct filter**: requests pass through the service itself, which
//!    answers blocked clients with the fixed block body and HTTP 409 (or
//!    a redirect to the configured fault action).

use crate::gate::{GateDecision, GateKeeper};
use crate::gates::{FastRequestsProtection, Landmine, MinimumRequestTimeDistance};
use crate::request::RequestInfo;
use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Body sent to blocked clients in direct-filter mode.
pub const BLOCKED_BODY: &str = "client has been blocked...";

/// Header the direct filter reads the session identifier from.
const SESSION_HEADER: &str = "x-session-id";

/// Shared application state.
pub struct AppState {
    pub fast_requests: GateKeeper<FastRequestsProtection>,
    pub min_distance: GateKeeper<MinimumRequestTimeDistance>,
    pub landmine: GateKeeper<Landmine>,
}

impl AppState {
    /// Run the request through every gate; the first closed gate wins.
    pub fn run_gates(&self, request: &RequestInfo) -> GateDecision {
        let decision = self.fast_requests.check(request);
        if !decision.is_admitted() {
            return decision;
        }
        let decision = self.min_distance.check(request);
        if !decision.is_admitted() {
            return decision;
        }
        self.landmine.check(request)
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Gate check request (external-auth mode).
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub remote_addr: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub form: HashMap<String, String>,
    #[serde(default)]
    pub query: HashMap<String, String>,
}

impl CheckRequest {
    fn into_request_info(self) -> RequestInfo {
        let mut request = RequestInfo::new();
        if let Some(addr) = self.remote_addr {
            request = request.with_remote_addr(addr);
        }
        if let Some(session) = self.session_id {
            request = request.with_session_id(session);
        }
        for (name, value) in self.headers {
            request = request.with_header(name, value);
        }
        for (name, value) in self.form {
            request = request.with_form_field(name, value);
        }
        for (name, value) in self.query {
            request = request.with_query_param(name, value);
        }
        request
    }
}

/// Gate check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    /// Name of the blocking gate, reported as the diagnostic fault source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_source: Option<&'static str>,
    /// Human-readable block reason, when the policy carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Redirect target for blocked clients, if one is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_action: Option<String>,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "request-gates",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Check the gate pipeline for a request described in the body.
///
/// Called by a reverse proxy before forwarding to the backend; it always
/// answers 200 so the proxy can read the decision from the body.
pub async fn check(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckRequest>,
) -> impl IntoResponse {
    debug!(
        remote_addr = ?payload.remote_addr,
        session_id = ?payload.session_id,
        "processing gate check"
    );

    let request = payload.into_request_info();
    match state.run_gates(&request) {
        GateDecision::Admitted => (
            StatusCode::OK,
            Json(CheckResponse {
                allowed: true,
                fault_source: None,
                reason: None,
                fault_action: None,
            }),
        ),
        GateDecision::Blocked {
            gate,
            reason,
            fault_action,
        } => {
            info!(gate, reason = ?reason, "request blocked");
            (
                StatusCode::OK,
                Json(CheckResponse {
                    allowed: false,
                    fault_source: Some(gate),
                    reason,
                    fault_action,
                }),
            )
        }
    }
}

/// Direct-filter handler: the service sits in the request path itself.
///
/// Blocked clients receive the fixed block body with HTTP 409, or a
/// redirect to the configured fault action carrying the blocking gate's
/// name as the `FaultSource` parameter.
pub async fn filter(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    form: Option<Form<HashMap<String, String>>>,
) -> Response {
    let mut request = RequestInfo::new().with_remote_addr(addr.ip().to_string());
    if let Some(session) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
        request = request.with_session_id(session);
    }
    for (name, value) in &headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    for (name, value) in query {
        request = request.with_query_param(name, value);
    }
    if let Some(Form(fields)) = form {
        for (name, value) in fields {
            request = request.with_form_field(name, value);
        }
    }

    match state.run_gates(&request) {
        GateDecision::Admitted => {
            debug!(ip = %addr.ip(), "request admitted");
            (StatusCode::OK, "request admitted").into_response()
        }
        GateDecision::Blocked {
            gate, fault_action, ..
        } => {
            info!(ip = %addr.ip(), gate, "request blocked");
            match fault_action {
                Some(action) => {
                    Redirect::to(&format!("{action}?FaultSource={gate}")).into_response()
                }
                None => (StatusCode::CONFLICT, BLOCKED_BODY).into_response(),
            }
        }
    }
}
