//! Checkout attempt store.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::checkout::{
        errors::CheckoutAttemptsError,
        records::{
            AttemptState, AttemptTransition, AttemptUuid, CheckoutAttemptRecord,
            NewCheckoutAttempt,
        },
        repository::PgCheckoutAttemptsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgCheckoutAttemptStore {
    db: Db,
    repository: PgCheckoutAttemptsRepository,
}

impl PgCheckoutAttemptStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCheckoutAttemptsRepository::new(),
        }
    }
}

#[async_trait]
impl CheckoutAttemptStore for PgCheckoutAttemptStore {
    async fn create_pending(
        &self,
        attempt: NewCheckoutAttempt,
    ) -> Result<CheckoutAttemptRecord, CheckoutAttemptsError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.create_attempt(&mut tx, attempt).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_attempt(
        &self,
        attempt: AttemptUuid,
    ) -> Result<CheckoutAttemptRecord, CheckoutAttemptsError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.get_attempt(&mut tx, attempt).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn transition(
        &self,
        attempt: AttemptUuid,
        transition: AttemptTransition,
    ) -> Result<CheckoutAttemptRecord, CheckoutAttemptsError> {
        let mut tx = self.db.begin().await?;

        let current = self
            .repository
            .get_attempt_for_update(&mut tx, attempt)
            .await?;

        if !current.state.can_transition_to(transition.state) {
            return Err(CheckoutAttemptsError::InvalidTransition {
                from: current.state,
                to: transition.state,
            });
        }

        let record = self
            .repository
            .update_attempt_state(&mut tx, attempt, transition)
            .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_by_state(
        &self,
        state: AttemptState,
    ) -> Result<Vec<CheckoutAttemptRecord>, CheckoutAttemptsError> {
        let mut tx = self.db.begin().await?;

        let records = self
            .repository
            .list_attempts_by_state(&mut tx, state)
            .await?;

        tx.commit().await?;

        Ok(records)
    }
}

#[automock]
#[async_trait]
/// Durable log of checkout attempts.
pub trait CheckoutAttemptStore: Send + Sync {
    /// Record a validated attempt before any payment is sent.
    async fn create_pending(
        &self,
        attempt: NewCheckoutAttempt,
    ) -> Result<CheckoutAttemptRecord, CheckoutAttemptsError>;

    /// Retrieve a single attempt.
    async fn get_attempt(
        &self,
        attempt: AttemptUuid,
    ) -> Result<CheckoutAttemptRecord, CheckoutAttemptsError>;

    /// Move an attempt forward.
    ///
    /// Fails with [`CheckoutAttemptsError::InvalidTransition`] if the current
    /// state does not allow it.
    async fn transition(
        &self,
        attempt: AttemptUuid,
        transition: AttemptTransition,
    ) -> Result<CheckoutAttemptRecord, CheckoutAttemptsError>;

    /// List attempts in `state`, oldest first.
    async fn list_by_state(
        &self,
        state: AttemptState,
    ) -> Result<Vec<CheckoutAttemptRecord>, CheckoutAttemptsError>;
}
