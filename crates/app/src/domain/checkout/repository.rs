//! Checkout Attempts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::{to_amount, try_get_amount},
    domain::{
        carts::records::CartUuid,
        checkout::records::{
            AttemptState, AttemptTransition, AttemptUuid, CheckoutAttemptRecord,
            NewCheckoutAttempt,
        },
        orders::records::OrderUuid,
        users::UserUuid,
    },
};

const CREATE_ATTEMPT_SQL: &str = include_str!("sql/create_attempt.sql");
const GET_ATTEMPT_SQL: &str = include_str!("sql/get_attempt.sql");
const GET_ATTEMPT_FOR_UPDATE_SQL: &str = include_str!("sql/get_attempt_for_update.sql");
const UPDATE_ATTEMPT_STATE_SQL: &str = include_str!("sql/update_attempt_state.sql");
const LIST_ATTEMPTS_BY_STATE_SQL: &str = include_str!("sql/list_attempts_by_state.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCheckoutAttemptsRepository;

impl PgCheckoutAttemptsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_attempt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        attempt: NewCheckoutAttempt,
    ) -> Result<CheckoutAttemptRecord, sqlx::Error> {
        query_as::<Postgres, CheckoutAttemptRecord>(CREATE_ATTEMPT_SQL)
            .bind(attempt.uuid.into_uuid())
            .bind(attempt.user_uuid.into_uuid())
            .bind(attempt.cart_uuid.into_uuid())
            .bind(to_amount(attempt.amount, "amount")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_attempt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        attempt: AttemptUuid,
    ) -> Result<CheckoutAttemptRecord, sqlx::Error> {
        query_as::<Postgres, CheckoutAttemptRecord>(GET_ATTEMPT_SQL)
            .bind(attempt.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_attempt_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        attempt: AttemptUuid,
    ) -> Result<CheckoutAttemptRecord, sqlx::Error> {
        query_as::<Postgres, CheckoutAttemptRecord>(GET_ATTEMPT_FOR_UPDATE_SQL)
            .bind(attempt.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_attempt_state(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        attempt: AttemptUuid,
        transition: AttemptTransition,
    ) -> Result<CheckoutAttemptRecord, sqlx::Error> {
        query_as::<Postgres, CheckoutAttemptRecord>(UPDATE_ATTEMPT_STATE_SQL)
            .bind(attempt.into_uuid())
            .bind(transition.state.as_str())
            .bind(transition.order_uuid.map(OrderUuid::into_uuid))
            .bind(transition.detail)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_attempts_by_state(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        state: AttemptState,
    ) -> Result<Vec<CheckoutAttemptRecord>, sqlx::Error> {
        query_as::<Postgres, CheckoutAttemptRecord>(LIST_ATTEMPTS_BY_STATE_SQL)
            .bind(state.as_str())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CheckoutAttemptRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let state: String = row.try_get("state")?;

        Ok(Self {
            uuid: AttemptUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            cart_uuid: CartUuid::from_uuid(row.try_get("cart_uuid")?),
            amount: try_get_amount(row, "amount")?,
            state: state.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "state".to_string(),
                source: Box::new(e),
            })?,
            order_uuid: row
                .try_get::<Option<Uuid>, _>("order_uuid")?
                .map(OrderUuid::from_uuid),
            detail: row.try_get("detail")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
