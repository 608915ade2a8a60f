// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Framework-neutral snapshot of an inbound request.
//!
//! The gate core never touches the hosting framework's request type; the
//! adapter copies the handful of fields the gates care about into a
//! [`RequestInfo`] before any check runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Part of the request a value is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestArea {
    /// Submitted form data (urlencoded body).
    #[default]
    Form,
    /// Request headers.
    Header,
    /// Query string parameters.
    QueryString,
    /// Anything the configuration layer could not map. Lookups in this
    /// area always yield nothing, so area-dependent gates fail closed.
    #[serde(other)]
    Unknown,
}

/// The request data the gate core operates on.
///
/// All fields are optional; gates treat absent data as "no information"
/// and the extractors yield an empty client id for it.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    remote_addr: Option<String>,
    session_id: Option<String>,
    headers: HashMap<String, String>,
    form: HashMap<String, String>,
    query: HashMap<String, String>,
}

impl RequestInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Header lookup is case-insensitive; header collections do not agree
    /// on casing across frameworks.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str).or_else(|| {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        })
    }

    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Whether any headers were captured. The host extractor falls back to
    /// the raw remote address when no header collection is available.
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Look up a named value in the given request area.
    pub fn lookup(&self, area: RequestArea, name: &str) -> Option<&str> {
        match area {
            RequestArea::Form => self.form_field(name),
            RequestArea::Header => self.header(name),
            RequestArea::QueryString => self.query_param(name),
            RequestArea::Unknown => None,
        }
    }
}
