//! Authentication filter.
//!
//! # State Machine
//! ```text
//! Start → Classified → Unprotected-Pass → Forwarded
//!                    → Protected-Checking → Forwarded (identity headers set)
//!                                         → Rejected (MissingCredential | InvalidCredential)
//! ```
//!
//! # Design Decisions
//! - This filter is the only place identity headers are written; client values
//!   for those names never survive a protected request
//! - Token material and claim values are never logged

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};

use crate::auth::claims::{ClaimsDecoder, KeyError};
use crate::auth::classifier::PathClassifier;
use crate::config::AuthConfig;
use crate::http::chain::{Outcome, Rejection, RequestFilter};
use crate::http::request::GatewayRequest;

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("invalid header name: {0}")]
    HeaderName(#[from] axum::http::header::InvalidHeaderName),
}

#[derive(Debug)]
pub struct AuthenticationFilter {
    classifier: PathClassifier,
    decoder: ClaimsDecoder,
    identity_header: HeaderName,
    role_header: HeaderName,
    strip_untrusted_identity: bool,
}

impl AuthenticationFilter {
    pub fn from_config(config: &AuthConfig) -> Result<Self, FilterError> {
        Ok(Self {
            classifier: PathClassifier::new(config.protected_marker.clone()),
            decoder: ClaimsDecoder::from_config(config)?,
            identity_header: HeaderName::from_bytes(config.identity_header.as_bytes())?,
            role_header: HeaderName::from_bytes(config.role_header.as_bytes())?,
            strip_untrusted_identity: config.strip_untrusted_identity,
        })
    }

    fn authenticate(&self, request: GatewayRequest) -> Outcome {
        let Some(raw) = request.headers().get(AUTHORIZATION) else {
            return Outcome::Reject(Rejection::MissingCredential);
        };
        let Some(token) = raw.to_str().ok().and_then(bearer_token) else {
            return Outcome::Reject(Rejection::InvalidCredential);
        };

        let claims = match self.decoder.decode(token) {
            Ok(claims) => claims,
            Err(_) => return Outcome::Reject(Rejection::InvalidCredential),
        };

        let (Ok(identity), Ok(role)) = (
            HeaderValue::from_str(claims.identity()),
            HeaderValue::from_str(claims.role()),
        ) else {
            return Outcome::Reject(Rejection::InvalidCredential);
        };

        Outcome::Forward(
            request
                .with_header(self.identity_header.clone(), identity)
                .with_header(self.role_header.clone(), role),
        )
    }
}

impl RequestFilter for AuthenticationFilter {
    fn process(&self, request: GatewayRequest) -> Outcome {
        let classification = match self.classifier.classify(request.inbound_path()) {
            Ok(c) => c,
            Err(rejection) => return Outcome::Reject(rejection),
        };
        let request = request.with_path(classification.rewritten_path);

        if classification.is_protected {
            return self.authenticate(request);
        }

        if self.strip_untrusted_identity {
            return Outcome::Forward(
                request
                    .without_header(&self.identity_header)
                    .without_header(&self.role_header),
            );
        }
        Outcome::Forward(request)
    }
}

/// Token from an `Authorization` value, with or without a `Bearer` scheme.
fn bearer_token(value: &str) -> Option<&str> {
    let value = value.trim();
    let token = match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => value[7..].trim_start(),
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}
