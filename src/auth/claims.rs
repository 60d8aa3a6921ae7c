//! Token verification and claim extraction.
//!
//! Every decode re-verifies signature and expiry; nothing is cached. All failure
//! causes collapse into [`InvalidToken`] so callers cannot tell them apart.

use std::fs;
use std::path::PathBuf;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::AuthConfig;

/// The single outcome of a failed decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid token")]
pub struct InvalidToken;

/// Errors building the verification key.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("auth.secret is empty")]
    MissingSecret,
    #[error("auth.public_key_path is required for {0:?}")]
    MissingPublicKey(Algorithm),
    #[error("failed to read public key {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid public key: {0}")]
    Pem(#[from] jsonwebtoken::errors::Error),
}

pub fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

/// Verified claims of one token.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    identity: String,
    role: String,
    all: Map<String, Value>,
}

impl Claims {
    /// Identity claim, stringified.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Role claim, stringified.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Any claim by name, as decoded.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.all.get(name)
    }
}

/// Render a claim value the way it is forwarded: strings verbatim, anything
/// else as JSON text.
pub fn claim_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Verifies bearer tokens against a fixed key.
#[derive(Clone)]
pub struct ClaimsDecoder {
    key: DecodingKey,
    validation: Validation,
    identity_claim: String,
    role_claim: String,
}

impl std::fmt::Debug for ClaimsDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsDecoder")
            .field("algorithms", &self.validation.algorithms)
            .field("identity_claim", &self.identity_claim)
            .field("role_claim", &self.role_claim)
            .finish_non_exhaustive()
    }
}

impl ClaimsDecoder {
    pub fn from_config(config: &AuthConfig) -> Result<Self, KeyError> {
        let key = if is_hmac(config.algorithm) {
            if config.secret.is_empty() {
                return Err(KeyError::MissingSecret);
            }
            DecodingKey::from_secret(config.secret.as_bytes())
        } else {
            let path = config
                .public_key_path
                .as_ref()
                .ok_or(KeyError::MissingPublicKey(config.algorithm))?;
            let pem = fs::read(path).map_err(|source| KeyError::Io {
                path: path.clone(),
                source,
            })?;
            match config.algorithm {
                Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(&pem)?,
                Algorithm::EdDSA => DecodingKey::from_ed_pem(&pem)?,
                _ => DecodingKey::from_rsa_pem(&pem)?,
            }
        };

        let mut validation = Validation::new(config.algorithm);
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            key,
            validation,
            identity_claim: config.identity_claim.clone(),
            role_claim: config.role_claim.clone(),
        })
    }

    /// Verify `token` and extract its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, InvalidToken> {
        let data = decode::<Map<String, Value>>(token, &self.key, &self.validation).map_err(
            |e| {
                tracing::debug!(kind = ?e.kind(), "Token rejected");
                InvalidToken
            },
        )?;

        let all = data.claims;
        let identity = required(&all, &self.identity_claim)?;
        let role = required(&all, &self.role_claim)?;

        Ok(Claims {
            identity,
            role,
            all,
        })
    }
}

fn required(claims: &Map<String, Value>, name: &str) -> Result<String, InvalidToken> {
    match claims.get(name) {
        None | Some(Value::Null) => {
            tracing::debug!(claim = name, "Token missing required claim");
            Err(InvalidToken)
        }
        Some(value) => Ok(claim_to_string(value)),
    }
}
