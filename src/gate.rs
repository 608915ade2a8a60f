// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Admission policy contract and the per-request orchestration.
//!
//! A [`Gate`] decides whether one client may proceed, based on either the
//! client's statistics table or the request content. The [`GateKeeper`]
//! runs a gate against every configured extractor and turns the first
//! failing check into a [`GateDecision::Blocked`]; the adapter layer maps
//! that decision onto a protocol response.

use crate::extractor::IdExtractor;
use crate::request::RequestInfo;
use crate::statistics::{ClientStatisticsTable, StatisticsRegistry};
use std::sync::Arc;
use tracing::{debug, warn};

/// A pluggable admission policy.
///
/// Both checks default to "admit" so a policy only overrides the side it
/// cares about; the `applies_*` switches let a policy opt out of a check
/// entirely so the keeper skips the call.
pub trait Gate: Send + Sync {
    /// Stable policy name, reported as the fault source when blocking.
    fn name(&self) -> &'static str;

    /// Whether the statistics check applies to this policy.
    fn applies_statistics_gate(&self) -> bool {
        true
    }

    /// Whether the request-content check applies to this policy.
    fn applies_request_gate(&self) -> bool {
        true
    }

    /// Check the client's statistics. `true` admits.
    fn statistics_gate(&self, _client_id: &str, _statistics: &ClientStatisticsTable) -> bool {
        true
    }

    /// Check the request content. `true` admits.
    fn request_gate(&self, _client_id: &str, _request: &RequestInfo) -> bool {
        true
    }

    /// Human-readable reason attached to a blocking decision, if the
    /// policy carries one.
    fn block_message(&self) -> Option<String> {
        None
    }
}

/// Outcome of running a request through a keeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Request may proceed.
    Admitted,
    /// Request is blocked.
    Blocked {
        /// Name of the blocking gate; the adapter passes it along as the
        /// `FaultSource` diagnostic.
        gate: &'static str,
        /// Human-readable block reason, if the policy carries one.
        reason: Option<String>,
        /// Redirect target configured for blocked clients, if any.
        fault_action: Option<String>,
    },
}

impl GateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GateDecision::Admitted)
    }
}

/// One extractor bound to its shared statistics table.
#[derive(Debug, Clone)]
pub struct ContextProcessor {
    extractor: IdExtractor,
    statistics: Arc<ClientStatisticsTable>,
}

impl ContextProcessor {
    /// Bind `extractor` to its registry-wide table.
    pub fn new(extractor: IdExtractor, registry: &StatisticsRegistry) -> Self {
        Self {
            statistics: registry.table_for(extractor),
            extractor,
        }
    }

    pub fn extractor(&self) -> IdExtractor {
        self.extractor
    }

    pub fn statistics(&self) -> &ClientStatisticsTable {
        &self.statistics
    }
}

/// Runs one gate against every configured extractor.
pub struct GateKeeper<G> {
    gate: G,
    processors: Vec<ContextProcessor>,
    fault_action: Option<String>,
}

impl<G: Gate> GateKeeper<G> {
    /// Keeper with the default extractor set: session id + user host.
    pub fn new(gate: G, registry: &StatisticsRegistry) -> Self {
        Self::with_extractors(
            gate,
            registry,
            &[IdExtractor::SessionId, IdExtractor::UserHost],
        )
    }

    /// Keeper with a custom extractor set.
    pub fn with_extractors(
        gate: G,
        registry: &StatisticsRegistry,
        extractors: &[IdExtractor],
    ) -> Self {
        let processors = extractors
            .iter()
            .map(|&extractor| ContextProcessor::new(extractor, registry))
            .collect();
        Self {
            gate,
            processors,
            fault_action: None,
        }
    }

    /// Redirect blocked clients to `action` instead of answering with the
    /// fixed block body.
    pub fn with_fault_action(mut self, action: impl Into<String>) -> Self {
        self.fault_action = Some(action.into());
        self
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    /// Run the gate for each extractor; the first failing check blocks
    /// the request. Statistics mutation is the only side effect and is
    /// visible to all future requests from the same client.
    pub fn check(&self, request: &RequestInfo) -> GateDecision {
        let applies_statistics = self.gate.applies_statistics_gate();
        let applies_request = self.gate.applies_request_gate();

        for processor in &self.processors {
            let client_id = processor.extractor().extract(request);
            let closed = (applies_statistics
                && !self.gate.statistics_gate(&client_id, processor.statistics()))
                || (applies_request && !self.gate.request_gate(&client_id, request));

            if closed {
                warn!(
                    gate = self.gate.name(),
                    extractor = processor.extractor().name(),
                    client_id = %client_id,
                    "gate closed, blocking request"
                );
                return GateDecision::Blocked {
                    gate: self.gate.name(),
                    reason: self.gate.block_message(),
                    fault_action: self.fault_action.clone(),
                };
            }

            debug!(
                gate = self.gate.name(),
                extractor = processor.extractor().name(),
                client_id = %client_id,
                "gate passed"
            );
        }

        GateDecision::Admitted
    }
}
