//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport settings.
///
/// ```
/// use conduit_config::ServerSettings;
///
/// let server = ServerSettings::default();
/// assert_eq!(server.http_addr, "0.0.0.0:8000");
/// assert!(server.request_timeout().is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// Bind address.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Drain period on shutdown, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Per-request deadline in milliseconds; 0 disables it.
    #[serde(default)]
    pub request_timeout_ms: u64,

    /// Send CORS headers and answer preflights.
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Largest request body read, in bytes. Longer bodies get 413.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl ServerSettings {
    /// Drain period as a [`Duration`].
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Request deadline, `None` when disabled.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: 0,
            cors_enabled: true,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> u64 {
    1024 * 1024
}

/// Token settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthSettings {
    /// HS256 signing secret.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Lifetime of issued tokens in seconds; unset issues tokens without `exp`.
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,

    /// Reject tokens that carry no `exp` claim.
    #[serde(default)]
    pub require_expiry: bool,
}

impl AuthSettings {
    /// Token lifetime as a [`Duration`].
    #[must_use]
    pub fn token_ttl(&self) -> Option<Duration> {
        self.token_ttl_secs.map(Duration::from_secs)
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_secs: None,
            require_expiry: false,
        }
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("require_expiry", &self.require_expiry)
            .finish()
    }
}

fn default_jwt_secret() -> String {
    "realworld_demo_secret_key".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable.
    Pretty,
}

impl From<LogFormat> for conduit_telemetry::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Install the log subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `conduit=debug,hyper=warn`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingSettings {
    /// Converts to the telemetry crate's config.
    #[must_use]
    pub fn to_log_config(&self) -> conduit_telemetry::LogConfig {
        conduit_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format.into(),
            ..conduit_telemetry::LogConfig::default()
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSettings {
    /// Install the exporter.
    #[serde(default)]
    pub enabled: bool,

    /// Scrape listener address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl MetricsSettings {
    /// Converts to the telemetry crate's config.
    #[must_use]
    pub fn to_metrics_config(&self) -> conduit_telemetry::MetricsConfig {
        conduit_telemetry::MetricsConfig {
            enabled: self.enabled,
            addr: self.addr.clone(),
            ..conduit_telemetry::MetricsConfig::default()
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

/// Telemetry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySettings {
    /// Logging.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Metrics.
    #[serde(default)]
    pub metrics: MetricsSettings,
}

impl TelemetrySettings {
    /// Converts to the telemetry crate's config.
    #[must_use]
    pub fn to_telemetry_config(&self) -> conduit_telemetry::TelemetryConfig {
        conduit_telemetry::TelemetryConfig {
            logging: self.logging.to_log_config(),
            metrics: self.metrics.to_metrics_config(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timeout_zero_disables() {
        let mut server = ServerSettings::default();
        assert_eq!(server.request_timeout(), None);
        server.request_timeout_ms = 1500;
        assert_eq!(server.request_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_body_limit_defaults_to_one_mebibyte() {
        assert_eq!(ServerSettings::default().max_body_bytes, 1_048_576);
        let server: ServerSettings = toml::from_str("max_body_bytes = 2048").unwrap();
        assert_eq!(server.max_body_bytes, 2048);
        assert!(server.cors_enabled);
    }

    #[test]
    fn test_auth_debug_redacts_secret() {
        let auth = AuthSettings::default();
        let printed = format!("{auth:?}");
        assert!(!printed.contains("realworld_demo_secret_key"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn test_log_format_lowercase() {
        let format: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(format, LogFormat::Pretty);
        assert_eq!(
            conduit_telemetry::LogFormat::from(format),
            conduit_telemetry::LogFormat::Pretty
        );
    }

    #[test]
    fn test_telemetry_conversion() {
        let settings = TelemetrySettings {
            logging: LoggingSettings {
                level: "debug".into(),
                ..LoggingSettings::default()
            },
            metrics: MetricsSettings {
                enabled: true,
                addr: "127.0.0.1:9100".into(),
            },
        };
        let config = settings.to_telemetry_config();
        assert_eq!(config.logging.level, "debug");
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.addr, "127.0.0.1:9100");
        assert!(!config.metrics.duration_buckets.is_empty());
    }
}
