//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Token verification and identity propagation.
    pub auth: AuthConfig,

    /// Route definitions mapping path prefixes to backend services.
    pub routes: Vec<RouteConfig>,

    /// Backend server definitions.
    pub backends: Vec<BackendConfig>,

    /// Load balancing settings.
    pub load_balancing: LoadBalancingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Signature algorithm tokens must be signed with.
    pub algorithm: Algorithm,

    /// Shared secret for HMAC algorithms.
    /// Overridden by `AUTH_GATEWAY_JWT_SECRET` when set.
    pub secret: String,

    /// PEM public key for RSA/EC algorithms.
    pub public_key_path: Option<PathBuf>,

    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,

    /// Required `iss` claim, if any.
    pub issuer: Option<String>,

    /// Required `aud` claim, if any.
    pub audience: Option<String>,

    /// Paths containing this marker (after prefix stripping) require a token.
    pub protected_marker: String,

    /// Claim carrying the caller identity.
    pub identity_claim: String,

    /// Claim carrying the caller role.
    pub role_claim: String,

    /// Header the identity is forwarded in.
    pub identity_header: String,

    /// Header the role is forwarded in.
    pub role_header: String,

    /// Remove client-supplied identity headers from unprotected requests too.
    pub strip_untrusted_identity: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::HS256,
            secret: String::new(),
            public_key_path: None,
            leeway_secs: 0,
            issuer: None,
            audience: None,
            protected_marker: "private-api".to_string(),
            identity_claim: "id".to_string(),
            role_claim: "role".to_string(),
            identity_header: "id".to_string(),
            role_header: "role".to_string(),
            strip_untrusted_identity: false,
        }
    }
}

/// Route configuration mapping a path prefix to a backend service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match (e.g. "/demo-service").
    pub path_prefix: String,

    /// Logical backend service name to forward to.
    pub backend: String,
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Logical service this server belongs to.
    pub service: String,

    /// Backend address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Maximum concurrent connections to this backend.
    #[serde(default = "default_max_backend_conns")]
    pub max_connections: usize,
}

fn default_max_backend_conns() -> usize {
    100
}

/// Load balancing strategy applied to every service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    RoundRobin,
    LeastConnections,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoadBalancingConfig {
    pub strategy: Strategy,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
