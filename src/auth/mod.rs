//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! GatewayRequest (inbound path, headers)
//!     → classifier.rs (strip service segment, protected?)
//!     → filter.rs (enforce Authorization on protected paths)
//!     → claims.rs (verify token, extract identity + role)
//!     → Outcome::Forward(rewritten request + identity headers) | Outcome::Reject
//! ```
//!
//! # Design Decisions
//! - Everything here is pure and synchronous; safe to share across tasks
//! - Nothing decoded is cached between requests
//! - Missing and invalid credentials are indistinguishable to the client

pub mod claims;
pub mod classifier;
pub mod filter;

pub use claims::{Claims, ClaimsDecoder, InvalidToken, KeyError};
pub use classifier::{Classification, PathClassifier};
pub use filter::{AuthenticationFilter, FilterError};

#[cfg(test)]
pub(crate) mod test_support {
    use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
    use serde_json::Value;

    use crate::config::AuthConfig;

    pub const SECRET: &str = "unit-test-secret";

    pub fn config() -> AuthConfig {
        AuthConfig {
            secret: SECRET.to_string(),
            ..AuthConfig::default()
        }
    }

    /// HS256 token expiring `ttl_secs` from now.
    pub fn mint(mut claims: Value, ttl_secs: i64, secret: &str) -> String {
        let exp = get_current_timestamp() as i64 + ttl_secs;
        claims["exp"] = Value::from(exp);
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }
}
