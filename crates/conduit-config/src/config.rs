//! The root configuration type.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::{AuthSettings, ConfigError, LogFormat, ServerSettings, TelemetrySettings};

/// Complete Conduit configuration.
///
/// Every section and field has a default, so an empty file is valid. Unknown
/// fields are rejected.
///
/// ```
/// use conduit_config::ConduitConfig;
///
/// let config = ConduitConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8000");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConduitConfig {
    /// Transport.
    #[serde(default)]
    pub server: ServerSettings,

    /// Tokens.
    #[serde(default)]
    pub auth: AuthSettings,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl ConduitConfig {
    /// Local development preset: pretty debug logs, loopback bind.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8000".to_string();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value("server.max_body_bytes", "must be positive"));
        }

        if self.telemetry.metrics.enabled
            && self.telemetry.metrics.addr.parse::<SocketAddr>().is_err()
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", self.telemetry.metrics.addr),
            ));
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::invalid_value("auth.jwt_secret", "must not be empty"));
        }

        if self.auth.token_ttl_secs == Some(0) {
            return Err(ConfigError::invalid_value("auth.token_ttl_secs", "must be positive"));
        }

        if self.auth.require_expiry && self.auth.token_ttl_secs.is_none() {
            return Err(ConfigError::invalid_value(
                "auth.require_expiry",
                "requires auth.token_ttl_secs, otherwise issued tokens would be rejected",
            ));
        }

        Ok(())
    }
}
