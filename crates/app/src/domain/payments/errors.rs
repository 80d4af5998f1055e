//! Payment gateway errors.

use thiserror::Error;

/// Errors that can occur when communicating with the payment service.
#[derive(Debug, Error)]
pub enum PaymentGatewayError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The payment service returned a non-2xx response or unexpected body.
    #[error("unexpected response from payment service: {0}")]
    UnexpectedResponse(String),

    /// The amount cannot be represented on the wire.
    #[error("amount {0} cannot be sent to the payment service")]
    InvalidAmount(u64),

    /// The payment service could not be reached.
    #[error("payment service unavailable")]
    Unavailable,
}
