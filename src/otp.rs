// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! One-time-password second-factor check.
//!
//! Shares the gate subsystem's pluggable-check contract but delegates the
//! actual token validation to an external backend behind the
//! [`OtpVerifier`] seam; the wire protocol to that backend is out of
//! scope here. Every failure funnels into one [`OtpError`] shape so the
//! adapter layer has a single thing to log, audit and redirect on.

use crate::config::OtpConfig;
use crate::request::RequestInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Status reported by the validation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpStatus {
    Ok,
    BadOtp,
    ReplayedOtp,
    BadSignature,
    MissingParameter,
    NoSuchClient,
    OperationNotAllowed,
    /// The backend call itself failed; transport errors are folded into
    /// this status so callers handle one failure shape.
    BackendError,
}

impl fmt::Display for OtpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::BadOtp => "bad OTP",
            Self::ReplayedOtp => "replayed OTP",
            Self::BadSignature => "bad signature",
            Self::MissingParameter => "missing parameter",
            Self::NoSuchClient => "no such client",
            Self::OperationNotAllowed => "operation not allowed",
            Self::BackendError => "backend error",
        };
        f.write_str(name)
    }
}

/// A validated token as reported by the backend.
#[derive(Debug, Clone)]
pub struct OtpResponse {
    pub status: OtpStatus,
    /// Public identifier of the token that generated the password.
    pub public_id: String,
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// External validation backend.
///
/// `Ok(None)` models a backend that answered without a result; the check
/// maps it to [`OtpError::NullResponse`].
pub trait OtpVerifier: Send + Sync {
    fn verify(&self, otp: &str) -> Result<Option<OtpResponse>, BoxError>;
}

/// Maps a token's public id to a user name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMapping {
    /// Name of the user.
    pub name: String,
    /// External id of the user (the one from the OTP system).
    pub external_id: String,
}

impl UserMapping {
    pub fn new(name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            external_id: external_id.into(),
        }
    }
}

/// Why an OTP check failed.
///
/// `Configuration` is deliberately distinct from the authentication
/// failures: a missing user table is a programmer/deployment error and
/// must not be presented to clients as a bad token.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("no one-time password present in the submitted form data")]
    NotPresent,
    #[error("the validation backend returned no response")]
    NullResponse,
    #[error("the validation backend rejected the one-time password: {0}")]
    InvalidResponse(OtpStatus),
    #[error("invalid OTP check configuration: {0}")]
    Configuration(&'static str),
}

/// The second-factor check itself.
pub struct OtpCheck<V> {
    config: OtpConfig,
    verifier: V,
}

impl<V: OtpVerifier> OtpCheck<V> {
    pub fn new(config: OtpConfig, verifier: V) -> Self {
        Self { config, verifier }
    }

    /// Check the one-time password submitted with `request`.
    ///
    /// `principal` is the name of the currently authenticated user; the
    /// validated token must map to it unless the skip flag is set, in
    /// which case any mapped token suffices.
    pub fn check(&self, request: &RequestInfo, principal: Option<&str>) -> Result<(), OtpError> {
        let otp = request
            .form_field(&self.config.field_name)
            .ok_or(OtpError::NotPresent)?;

        let response = self
            .verifier
            .verify(otp)
            .map_err(|error| {
                debug!(%error, "OTP backend call failed");
                OtpError::InvalidResponse(OtpStatus::BackendError)
            })?
            .ok_or(OtpError::NullResponse)?;

        if response.status != OtpStatus::Ok {
            return Err(OtpError::InvalidResponse(response.status));
        }

        let users = self
            .config
            .users
            .as_deref()
            .ok_or(OtpError::Configuration("the user mapping table is missing"))?;

        if self.identity_matches(users, &response, principal) {
            return Ok(());
        }

        Err(OtpError::InvalidResponse(response.status))
    }

    fn identity_matches(
        &self,
        users: &[UserMapping],
        response: &OtpResponse,
        principal: Option<&str>,
    ) -> bool {
        let mapped = users
            .iter()
            .find(|user| user.external_id == response.public_id);
        if self.config.skip_identity_name_check {
            mapped.is_some()
        } else {
            mapped.map(|user| user.name.as_str()) == principal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticVerifier(Result<Option<OtpResponse>, &'static str>);

    impl OtpVerifier for StaticVerifier {
        fn verify(&self, _otp: &str) -> Result<Option<OtpResponse>, BoxError> {
            match &self.0 {
                Ok(response) => Ok(response.clone()),
                Err(message) => Err((*message).into()),
            }
        }
    }

    fn config_with_users() -> OtpConfig {
        OtpConfig {
            users: Some(vec![UserMapping::new("alice", "cccccc000001")]),
            ..Default::default()
        }
    }

    fn request_with_otp() -> RequestInfo {
        RequestInfo::new().with_form_field("otp", "cccccc000001abcdef")
    }

    fn ok_response(public_id: &str) -> Option<OtpResponse> {
        Some(OtpResponse {
            status: OtpStatus::Ok,
            public_id: public_id.to_string(),
        })
    }

    #[test]
    fn missing_field_fails_with_not_present() {
        let check = OtpCheck::new(
            config_with_users(),
            StaticVerifier(Ok(ok_response("cccccc000001"))),
        );
        let result = check.check(&RequestInfo::new(), Some("alice"));
        assert!(matches!(result, Err(OtpError::NotPresent)));
    }

    #[test]
    fn backend_error_wraps_into_invalid_response() {
        let check = OtpCheck::new(config_with_users(), StaticVerifier(Err("connection refused")));
        let result = check.check(&request_with_otp(), Some("alice"));
        assert!(matches!(
            result,
            Err(OtpError::InvalidResponse(OtpStatus::BackendError))
        ));
    }

    #[test]
    fn absent_backend_result_fails_with_null_response() {
        let check = OtpCheck::new(config_with_users(), StaticVerifier(Ok(None)));
        let result = check.check(&request_with_otp(), Some("alice"));
        assert!(matches!(result, Err(OtpError::NullResponse)));
    }

    #[test]
    fn missing_user_table_is_a_configuration_error() {
        let check = OtpCheck::new(
            OtpConfig::default(),
            StaticVerifier(Ok(ok_response("cccccc000001"))),
        );
        let result = check.check(&request_with_otp(), Some("alice"));
        assert!(matches!(result, Err(OtpError::Configuration(_))));
    }

    #[test]
    fn non_ok_status_fails_with_that_status() {
        let check = OtpCheck::new(
            config_with_users(),
            StaticVerifier(Ok(Some(OtpResponse {
                status: OtpStatus::ReplayedOtp,
                public_id: "cccccc000001".to_string(),
            }))),
        );
        let result = check.check(&request_with_otp(), Some("alice"));
        assert!(matches!(
            result,
            Err(OtpError::InvalidResponse(OtpStatus::ReplayedOtp))
        ));
    }

    #[test]
    fn non_ok_status_wins_over_a_missing_user_table() {
        let check = OtpCheck::new(
            OtpConfig::default(),
            StaticVerifier(Ok(Some(OtpResponse {
                status: OtpStatus::BadOtp,
                public_id: "cccccc000001".to_string(),
            }))),
        );
        let result = check.check(&request_with_otp(), Some("alice"));
        assert!(matches!(
            result,
            Err(OtpError::InvalidResponse(OtpStatus::BadOtp))
        ));
    }

    #[test]
    fn mapped_token_with_matching_principal_passes() {
        let check = OtpCheck::new(
            config_with_users(),
            StaticVerifier(Ok(ok_response("cccccc000001"))),
        );
        assert!(check.check(&request_with_otp(), Some("alice")).is_ok());
    }

    #[test]
    fn mapped_token_with_wrong_principal_fails() {
        let check = OtpCheck::new(
            config_with_users(),
            StaticVerifier(Ok(ok_response("cccccc000001"))),
        );
        let result = check.check(&request_with_otp(), Some("mallory"));
        assert!(matches!(
            result,
            Err(OtpError::InvalidResponse(OtpStatus::Ok))
        ));
    }

    #[test]
    fn unmapped_token_fails_even_with_skip_flag() {
        let mut config = config_with_users();
        config.skip_identity_name_check = true;
        let check = OtpCheck::new(config, StaticVerifier(Ok(ok_response("dddddd999999"))));
        let result = check.check(&request_with_otp(), Some("alice"));
        assert!(matches!(
            result,
            Err(OtpError::InvalidResponse(OtpStatus::Ok))
        ));
    }

    #[test]
    fn skip_flag_admits_any_mapped_token() {
        let mut config = config_with_users();
        config.skip_identity_name_check = true;
        let check = OtpCheck::new(config, StaticVerifier(Ok(ok_response("cccccc000001"))));
        assert!(check.check(&request_with_otp(), Some("mallory")).is_ok());
    }
}
