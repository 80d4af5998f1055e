//! Payment Service Config

use std::time::Duration;

use clap::Args;
use shopfront_app::domain::payments::http::PaymentServiceConfig;

/// Payment service settings.
#[derive(Debug, Args)]
pub struct PaymentsConfig {
    /// Payment service base URL
    #[arg(long, env = "PAYMENT_SERVICE_URL", default_value = "http://localhost:8081")]
    pub payment_service_url: String,

    /// Timeout for each payment service request, in seconds
    #[arg(long, env = "PAYMENT_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub payment_timeout_seconds: u64,

    /// ISO currency code sent with payments and refunds
    #[arg(long = "payment-currency", env = "PAYMENT_CURRENCY", default_value = "GBP")]
    pub currency: String,
}

impl PaymentsConfig {
    /// Client settings for the payment service.
    #[must_use]
    pub fn service_config(&self) -> PaymentServiceConfig {
        PaymentServiceConfig {
            base_url: self.payment_service_url.clone(),
            timeout: Duration::from_secs(self.payment_timeout_seconds),
        }
    }
}
