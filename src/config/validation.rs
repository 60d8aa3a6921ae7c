//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing services)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::auth::claims::is_hmac;
use crate::config::schema::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listener address '{0}'")]
    InvalidBindAddress(String),
    #[error("auth.secret must be set for HMAC algorithms")]
    MissingSecret,
    #[error("auth.public_key_path must be set for asymmetric algorithms")]
    MissingPublicKey,
    #[error("auth.protected_marker must not be empty")]
    EmptyMarker,
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),
    #[error("identity and role headers must differ")]
    ConflictingHeaders,
    #[error("duplicate route name '{0}'")]
    DuplicateRoute(String),
    #[error("route '{route}' has invalid prefix '{prefix}'")]
    InvalidPrefix { route: String, prefix: String },
    #[error("route '{route}' references unknown service '{service}'")]
    UnknownService { route: String, service: String },
    #[error("invalid backend address '{0}'")]
    InvalidBackendAddress(String),
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let auth = &config.auth;
    if is_hmac(auth.algorithm) {
        if auth.secret.is_empty() {
            errors.push(ValidationError::MissingSecret);
        }
    } else if auth.public_key_path.is_none() {
        errors.push(ValidationError::MissingPublicKey);
    }
    if auth.protected_marker.is_empty() {
        errors.push(ValidationError::EmptyMarker);
    }
    for name in [&auth.identity_header, &auth.role_header] {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }
    if auth.identity_header.eq_ignore_ascii_case(&auth.role_header) {
        errors.push(ValidationError::ConflictingHeaders);
    }

    let services: HashSet<&str> = config.backends.iter().map(|b| b.service.as_str()).collect();
    let mut names = HashSet::new();
    for route in &config.routes {
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
        let prefix = &route.path_prefix;
        if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
            errors.push(ValidationError::InvalidPrefix {
                route: route.name.clone(),
                prefix: prefix.clone(),
            });
        }
        if !services.contains(route.backend.as_str()) {
            errors.push(ValidationError::UnknownService {
                route: route.name.clone(),
                service: route.backend.clone(),
            });
        }
    }

    for backend in &config.backends {
        if backend.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidBackendAddress(backend.address.clone()));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
