//! Server configuration module

use clap::Parser;

use crate::config::{
    db::DatabaseConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    payments::PaymentsConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod db;
pub(crate) mod observability;
pub(crate) mod payments;
pub(crate) mod server;

/// Shopfront JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "shopfront-json", about = "Shopfront JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Request observability settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Storage backend settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Payment service settings.
    #[command(flatten)]
    pub payments: PaymentsConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;

    use super::*;
    use crate::config::{db::StorageBackend, observability::LogFormat};

    #[test]
    fn flags_override_defaults() -> TestResult {
        let config = ServerConfig::try_parse_from([
            "shopfront-json",
            "--port",
            "9000",
            "--log-format",
            "json",
            "--storage-backend",
            "memory",
            "--payment-service-url",
            "http://payments.internal:8081",
            "--payment-timeout-seconds",
            "3",
            "--payment-currency",
            "EUR",
        ])?;

        assert_eq!(config.socket_addr(), "0.0.0.0:9000");
        assert!(
            matches!(config.logging.log_format, LogFormat::Json),
            "expected json log format"
        );
        assert_eq!(config.database.storage_backend, StorageBackend::Memory);
        assert_eq!(
            config.payments.service_config().timeout,
            Duration::from_secs(3)
        );
        assert_eq!(
            config.payments.service_config().base_url,
            "http://payments.internal:8081"
        );
        assert_eq!(config.payments.currency, "EUR");

        Ok(())
    }
}
