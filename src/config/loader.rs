//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `auth.secret`.
pub const SECRET_ENV: &str = "AUTH_GATEWAY_JWT_SECRET";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;

    if let Ok(secret) = std::env::var(SECRET_ENV) {
        config.auth.secret = secret;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse configuration text without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Strategy;
    use jsonwebtoken::Algorithm;

    #[test]
    fn parses_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [auth]
            algorithm = "HS384"
            secret = "s3cret"
            protected_marker = "internal"

            [load_balancing]
            strategy = "least_connections"

            [[routes]]
            name = "demo"
            path_prefix = "/demo-service"
            backend = "demo-service"

            [[backends]]
            service = "demo-service"
            address = "127.0.0.1:3000"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.auth.algorithm, Algorithm::HS384);
        assert_eq!(config.auth.protected_marker, "internal");
        assert_eq!(config.auth.identity_header, "id");
        assert_eq!(config.load_balancing.strategy, Strategy::LeastConnections);
        assert_eq!(config.routes[0].backend, "demo-service");
        assert_eq!(config.backends[0].max_connections, 100);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.auth.protected_marker, "private-api");
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn rejects_unknown_strategy() {
        let err = parse_config("[load_balancing]\nstrategy = \"random\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
