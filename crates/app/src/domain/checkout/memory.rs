//! In-memory checkout attempt store.

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::checkout::{
    errors::CheckoutAttemptsError,
    records::{
        AttemptState, AttemptTransition, AttemptUuid, CheckoutAttemptRecord, NewCheckoutAttempt,
    },
    store::CheckoutAttemptStore,
};

/// Attempt log held in process memory, used for local development and tests.
#[derive(Debug, Default)]
pub struct InMemoryCheckoutAttemptStore {
    attempts: RwLock<FxHashMap<AttemptUuid, CheckoutAttemptRecord>>,
}

impl InMemoryCheckoutAttemptStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every attempt recorded, oldest first.
    pub async fn all(&self) -> Vec<CheckoutAttemptRecord> {
        let mut attempts: Vec<_> = self.attempts.read().await.values().cloned().collect();

        attempts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.uuid.cmp(&b.uuid)));

        attempts
    }

    /// Pretend `attempt` was last touched `age` earlier than recorded.
    #[cfg(test)]
    pub(crate) async fn backdate(&self, attempt: AttemptUuid, age: jiff::SignedDuration) {
        if let Some(record) = self.attempts.write().await.get_mut(&attempt)
            && let Ok(earlier) = record.updated_at.checked_sub(age)
        {
            record.created_at = earlier;
            record.updated_at = earlier;
        }
    }
}

#[async_trait]
impl CheckoutAttemptStore for InMemoryCheckoutAttemptStore {
    async fn create_pending(
        &self,
        attempt: NewCheckoutAttempt,
    ) -> Result<CheckoutAttemptRecord, CheckoutAttemptsError> {
        let mut attempts = self.attempts.write().await;

        if attempts.contains_key(&attempt.uuid) {
            return Err(CheckoutAttemptsError::AlreadyExists);
        }

        let now = Timestamp::now();

        let record = CheckoutAttemptRecord {
            uuid: attempt.uuid,
            user_uuid: attempt.user_uuid,
            cart_uuid: attempt.cart_uuid,
            amount: attempt.amount,
            state: AttemptState::Pending,
            order_uuid: None,
            detail: None,
            created_at: now,
            updated_at: now,
        };

        attempts.insert(record.uuid, record.clone());

        Ok(record)
    }

    async fn get_attempt(
        &self,
        attempt: AttemptUuid,
    ) -> Result<CheckoutAttemptRecord, CheckoutAttemptsError> {
        self.attempts
            .read()
            .await
            .get(&attempt)
            .cloned()
            .ok_or(CheckoutAttemptsError::NotFound)
    }

    async fn transition(
        &self,
        attempt: AttemptUuid,
        transition: AttemptTransition,
    ) -> Result<CheckoutAttemptRecord, CheckoutAttemptsError> {
        let mut attempts = self.attempts.write().await;

        let record = attempts
            .get_mut(&attempt)
            .ok_or(CheckoutAttemptsError::NotFound)?;

        if !record.state.can_transition_to(transition.state) {
            return Err(CheckoutAttemptsError::InvalidTransition {
                from: record.state,
                to: transition.state,
            });
        }

        record.state = transition.state;
        record.order_uuid = transition.order_uuid.or(record.order_uuid);
        record.detail = transition.detail.or_else(|| record.detail.take());
        record.updated_at = Timestamp::now();

        Ok(record.clone())
    }

    async fn list_by_state(
        &self,
        state: AttemptState,
    ) -> Result<Vec<CheckoutAttemptRecord>, CheckoutAttemptsError> {
        Ok(self
            .all()
            .await
            .into_iter()
            .filter(|attempt| attempt.state == state)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::domain::{
        carts::records::CartUuid, orders::records::OrderUuid, users::UserUuid,
    };

    fn new_attempt() -> NewCheckoutAttempt {
        NewCheckoutAttempt {
            uuid: AttemptUuid::new(),
            user_uuid: UserUuid::new(),
            cart_uuid: CartUuid::new(),
            amount: 10_00,
        }
    }

    #[tokio::test]
    async fn attempts_start_pending_and_move_forward() -> TestResult {
        let store = InMemoryCheckoutAttemptStore::new();
        let attempt = store.create_pending(new_attempt()).await?;
        let order = OrderUuid::new();

        assert_eq!(attempt.state, AttemptState::Pending);

        store
            .transition(attempt.uuid, AttemptTransition::to(AttemptState::Paid))
            .await?;

        let committed = store
            .transition(
                attempt.uuid,
                AttemptTransition::to(AttemptState::Committed).with_order(order),
            )
            .await?;

        assert_eq!(committed.state, AttemptState::Committed);
        assert_eq!(committed.order_uuid, Some(order));

        Ok(())
    }

    #[tokio::test]
    async fn backwards_transition_is_rejected() -> TestResult {
        let store = InMemoryCheckoutAttemptStore::new();
        let attempt = store.create_pending(new_attempt()).await?;

        store
            .transition(attempt.uuid, AttemptTransition::to(AttemptState::Declined))
            .await?;

        let result = store
            .transition(attempt.uuid, AttemptTransition::to(AttemptState::Paid))
            .await;

        assert!(
            matches!(
                result,
                Err(CheckoutAttemptsError::InvalidTransition {
                    from: AttemptState::Declined,
                    to: AttemptState::Paid
                })
            ),
            "expected InvalidTransition, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn detail_survives_later_transitions() -> TestResult {
        let store = InMemoryCheckoutAttemptStore::new();
        let attempt = store.create_pending(new_attempt()).await?;

        store
            .transition(
                attempt.uuid,
                AttemptTransition::to(AttemptState::Unconfirmed).with_detail("timed out"),
            )
            .await?;

        let compensated = store
            .transition(attempt.uuid, AttemptTransition::to(AttemptState::Compensated))
            .await?;

        assert_eq!(compensated.detail.as_deref(), Some("timed out"));

        let listed = store.list_by_state(AttemptState::Compensated).await?;

        assert_eq!(listed, vec![compensated]);

        Ok(())
    }
}
