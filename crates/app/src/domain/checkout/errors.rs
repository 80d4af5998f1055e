//! Checkout errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    carts::CartsServiceError,
    checkout::records::{AttemptState, AttemptUuid},
    orders::{OrdersServiceError, records::OrderUuid},
    payments::PaymentGatewayError,
};

/// Failures of the checkout attempt log.
#[derive(Debug, Error)]
pub enum CheckoutAttemptsError {
    #[error("checkout attempt already exists")]
    AlreadyExists,

    #[error("checkout attempt not found")]
    NotFound,

    #[error("checkout attempt cannot move from {from} to {to}")]
    InvalidTransition { from: AttemptState, to: AttemptState },

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CheckoutAttemptsError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(
                ErrorKind::CheckViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::ForeignKeyViolation,
            ) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

/// Ways a checkout can end without an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("payment declined")]
    PaymentDeclined { attempt: AttemptUuid },

    #[error("order could not be saved after payment (attempt {attempt}, refunded: {compensated})")]
    PersistFailure {
        attempt: AttemptUuid,
        compensated: bool,
    },

    #[error("order {order} was placed but the cart could not be cleared (attempt {attempt})")]
    CartNotCleared { attempt: AttemptUuid, order: OrderUuid },

    #[error("checkout task stopped before recording an outcome (attempt {attempt})")]
    Interrupted { attempt: AttemptUuid },

    #[error("checkout attempt {attempt} is {state} and cannot be compensated")]
    NotCompensable {
        attempt: AttemptUuid,
        state: AttemptState,
    },

    #[error("payment service refused the refund for attempt {attempt}")]
    RefundRefused { attempt: AttemptUuid },

    #[error("payment service error")]
    Payment(#[from] PaymentGatewayError),

    #[error("cart error")]
    Cart(#[from] CartsServiceError),

    #[error("checkout attempt log error")]
    Attempts(#[from] CheckoutAttemptsError),

    #[error("cart cannot be turned into an order")]
    Order(#[from] OrdersServiceError),
}
