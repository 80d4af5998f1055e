//! In-memory payment gateway.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::Mutex;

use crate::domain::{
    checkout::records::AttemptUuid,
    payments::{errors::PaymentGatewayError, gateway::PaymentGateway, records::PaymentRequest},
    users::UserUuid,
};

#[derive(Debug, Default)]
struct Ledger {
    balances: FxHashMap<UserUuid, u64>,
    payments: FxHashMap<AttemptUuid, PaymentRequest>,
    refunds: FxHashSet<AttemptUuid>,
}

/// Balances held in process memory, honouring idempotency keys.
///
/// Used for local development and tests. Users without a balance have zero funds.
#[derive(Debug)]
pub struct InMemoryPaymentGateway {
    ledger: Mutex<Ledger>,
    online: AtomicBool,
}

impl Default for InMemoryPaymentGateway {
    fn default() -> Self {
        Self {
            ledger: Mutex::default(),
            online: AtomicBool::new(true),
        }
    }
}

impl InMemoryPaymentGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_balance(&self, user: UserUuid, balance: u64) {
        self.ledger.lock().await.balances.insert(user, balance);
    }

    pub async fn balance_of(&self, user: UserUuid) -> u64 {
        self.ledger
            .lock()
            .await
            .balances
            .get(&user)
            .copied()
            .unwrap_or_default()
    }

    /// Simulate the service going away or coming back.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of distinct payments applied.
    pub async fn payment_count(&self) -> usize {
        self.ledger.lock().await.payments.len()
    }

    /// Number of distinct refunds applied.
    pub async fn refund_count(&self) -> usize {
        self.ledger.lock().await.refunds.len()
    }

    fn ensure_online(&self) -> Result<(), PaymentGatewayError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PaymentGatewayError::Unavailable)
        }
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn check_balance(
        &self,
        user: UserUuid,
        amount: u64,
    ) -> Result<bool, PaymentGatewayError> {
        self.ensure_online()?;

        Ok(self.balance_of(user).await >= amount)
    }

    async fn make_payment(&self, request: &PaymentRequest) -> Result<bool, PaymentGatewayError> {
        self.ensure_online()?;

        let mut ledger = self.ledger.lock().await;

        if ledger.payments.contains_key(&request.idempotency_key) {
            return Ok(true);
        }

        let balance = ledger.balances.entry(request.user_uuid).or_default();

        let Some(remaining) = balance.checked_sub(request.amount) else {
            return Ok(false);
        };

        *balance = remaining;

        ledger
            .payments
            .insert(request.idempotency_key, request.clone());

        Ok(true)
    }

    async fn refund(&self, request: &PaymentRequest) -> Result<bool, PaymentGatewayError> {
        self.ensure_online()?;

        let mut ledger = self.ledger.lock().await;

        if ledger.refunds.contains(&request.idempotency_key) {
            return Ok(true);
        }

        let Some(amount) = ledger
            .payments
            .get(&request.idempotency_key)
            .map(|payment| payment.amount)
        else {
            return Ok(false);
        };

        let balance = ledger.balances.entry(request.user_uuid).or_default();

        *balance = balance.saturating_add(amount);

        ledger.refunds.insert(request.idempotency_key);

        Ok(true)
    }

    async fn health_check(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn request(user: UserUuid, amount: u64) -> PaymentRequest {
        PaymentRequest {
            user_uuid: user,
            amount,
            currency: "GBP".to_string(),
            idempotency_key: AttemptUuid::new(),
        }
    }

    #[tokio::test]
    async fn payment_debits_once_per_key() -> TestResult {
        let gateway = InMemoryPaymentGateway::new();
        let user = UserUuid::new();

        gateway.set_balance(user, 30_00).await;

        let payment = request(user, 10_00);

        assert!(gateway.make_payment(&payment).await?);
        assert!(gateway.make_payment(&payment).await?);
        assert_eq!(gateway.balance_of(user).await, 20_00);
        assert_eq!(gateway.payment_count().await, 1);

        Ok(())
    }

    #[tokio::test]
    async fn insufficient_funds_are_declined() -> TestResult {
        let gateway = InMemoryPaymentGateway::new();
        let user = UserUuid::new();

        gateway.set_balance(user, 5_00).await;

        assert!(!gateway.check_balance(user, 10_00).await?);
        assert!(!gateway.make_payment(&request(user, 10_00)).await?);
        assert_eq!(gateway.balance_of(user).await, 5_00);

        Ok(())
    }

    #[tokio::test]
    async fn refund_restores_balance_once() -> TestResult {
        let gateway = InMemoryPaymentGateway::new();
        let user = UserUuid::new();

        gateway.set_balance(user, 10_00).await;

        let payment = request(user, 10_00);

        gateway.make_payment(&payment).await?;

        assert!(gateway.refund(&payment).await?);
        assert!(gateway.refund(&payment).await?);
        assert_eq!(gateway.balance_of(user).await, 10_00);
        assert_eq!(gateway.refund_count().await, 1);

        Ok(())
    }

    #[tokio::test]
    async fn refund_without_payment_is_refused() -> TestResult {
        let gateway = InMemoryPaymentGateway::new();

        assert!(!gateway.refund(&request(UserUuid::new(), 1_00)).await?);

        Ok(())
    }

    #[tokio::test]
    async fn offline_gateway_errors() {
        let gateway = InMemoryPaymentGateway::new();

        gateway.set_online(false);

        assert!(!gateway.health_check().await);

        let result = gateway.make_payment(&request(UserUuid::new(), 1_00)).await;

        assert!(
            matches!(result, Err(PaymentGatewayError::Unavailable)),
            "expected Unavailable, got {result:?}"
        );
    }
}
