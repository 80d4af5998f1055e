//! HTTP client for the payment service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{
    checkout::records::AttemptUuid,
    payments::{
        errors::PaymentGatewayError,
        gateway::PaymentGateway,
        records::{PaymentRequest, to_major_units},
    },
    users::UserUuid,
};

const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Configuration for connecting to the payment service.
#[derive(Debug, Clone)]
pub struct PaymentServiceConfig {
    /// Base address, e.g. `"http://localhost:8081"`.
    pub base_url: String,

    /// Upper bound on each request, connection included.
    pub timeout: Duration,
}

/// [`PaymentGateway`] speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    base_url: String,
    http: Client,
}

impl HttpPaymentGateway {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: PaymentServiceConfig) -> Result<Self, PaymentGatewayError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn transfer(
        &self,
        path: &str,
        request: &PaymentRequest,
    ) -> Result<bool, PaymentGatewayError> {
        let url = format!("{}/{path}", self.base_url);

        let body = TransferBody {
            user_id: request.user_uuid,
            amount: to_major_units(request.amount)?,
            currency: &request.currency,
            idempotency_key: request.idempotency_key,
        };

        let response = self
            .http
            .post(&url)
            .header(IDEMPOTENCY_KEY_HEADER, request.idempotency_key.to_string())
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            warn!(
                %status,
                attempt_uuid = %request.idempotency_key,
                body = %text,
                "payment service rejected {path} request"
            );

            return Ok(false);
        }

        let parsed: TransferResponse = response.json().await?;

        debug!(
            transaction_id = parsed.transaction_id.as_deref().unwrap_or_default(),
            status = ?parsed.status,
            "payment service answered {path} request"
        );

        Ok(parsed.status == TransferStatus::Success)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[tracing::instrument(
        name = "payments.http.check_balance",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn check_balance(
        &self,
        user: UserUuid,
        amount: u64,
    ) -> Result<bool, PaymentGatewayError> {
        let required = to_major_units(amount)?;

        let url = format!("{}/balance/{user}", self.base_url);

        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(PaymentGatewayError::UnexpectedResponse(format!(
                "balance request failed with status {status}: {text}"
            )));
        }

        let parsed: BalanceResponse = response.json().await?;

        Ok(parsed.balance >= required)
    }

    #[tracing::instrument(
        name = "payments.http.make_payment",
        skip(self, request),
        fields(
            user_uuid = %request.user_uuid,
            attempt_uuid = %request.idempotency_key,
            amount = request.amount
        ),
        err
    )]
    async fn make_payment(&self, request: &PaymentRequest) -> Result<bool, PaymentGatewayError> {
        self.transfer("payments", request).await
    }

    #[tracing::instrument(
        name = "payments.http.refund",
        skip(self, request),
        fields(
            user_uuid = %request.user_uuid,
            attempt_uuid = %request.idempotency_key,
            amount = request.amount
        ),
        err
    )]
    async fn refund(&self, request: &PaymentRequest) -> Result<bool, PaymentGatewayError> {
        self.transfer("refunds", request).await
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);

        let response = match self.http.get(&url).send().await {
            Ok(response) if response.status() == StatusCode::OK => response,
            Ok(response) => {
                warn!(status = %response.status(), "payment service health check failed");

                return false;
            }
            Err(error) => {
                warn!(%error, "payment service unreachable");

                return false;
            }
        };

        response
            .json::<HealthResponse>()
            .await
            .is_ok_and(|health| health.status == HealthStatus::Up)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferBody<'a> {
    user_id: UserUuid,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    currency: &'a str,
    idempotency_key: AttemptUuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferResponse {
    #[serde(default)]
    transaction_id: Option<String>,
    status: TransferStatus,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TransferStatus {
    Success,
    Failed,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: HealthStatus,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum HealthStatus {
    Up,
    Down,
}
