//! Payment gateway.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    payments::{errors::PaymentGatewayError, records::PaymentRequest},
    users::UserUuid,
};

#[automock]
#[async_trait]
/// Client for the external payment and balance service.
pub trait PaymentGateway: Send + Sync {
    /// Whether the user's balance covers `amount` minor units.
    ///
    /// Advisory only; a later payment can still be declined.
    async fn check_balance(&self, user: UserUuid, amount: u64)
    -> Result<bool, PaymentGatewayError>;

    /// Debit the user. `Ok(false)` means the payment was declined and no money moved.
    async fn make_payment(&self, request: &PaymentRequest) -> Result<bool, PaymentGatewayError>;

    /// Credit back a previous payment carrying the same idempotency key.
    async fn refund(&self, request: &PaymentRequest) -> Result<bool, PaymentGatewayError>;

    /// `true` when the service reports itself up. Never errors.
    async fn health_check(&self) -> bool;
}
