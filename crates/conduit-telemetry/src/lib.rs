//! Observability for Conduit.
//!
//! - **Logging**: `tracing` events rendered by a `tracing-subscriber` fmt
//!   layer, JSON in production and pretty for local runs
//! - **Metrics**: the `metrics` facade backed by a Prometheus exporter
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `conduit_requests_total` | Counter | `operation`, `status` | Completed calls |
//! | `conduit_request_duration_seconds` | Histogram | `operation` | Call latency |
//! | `conduit_in_flight_requests` | Gauge | - | Requests being served |
//!
//! # Example
//!
//! ```rust,no_run
//! use conduit_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_telemetry(&TelemetryConfig::default()).unwrap();
//!     tracing::info!(operation_id = "/realworld.v1.RealWorld/GetTags", "ready");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/conduit-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, record_call, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Configuration for every telemetry subsystem.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Logging configuration.
    pub logging: LogConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

/// Initializes logging, then metrics.
///
/// Must be called from inside a tokio runtime when metrics are enabled.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_telemetry_is_a_no_op() {
        let config = TelemetryConfig {
            logging: LogConfig {
                enabled: false,
                ..LogConfig::default()
            },
            metrics: MetricsConfig {
                enabled: false,
                ..MetricsConfig::default()
            },
        };
        assert!(init_telemetry(&config).is_ok());
    }
}
