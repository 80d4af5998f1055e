//! Checkout Errors

use salvo::http::StatusError;
use tracing::error;

use shopfront_app::domain::checkout::CheckoutError;

use crate::observability::CheckoutOutcome;

pub(crate) fn outcome_of(error: &CheckoutError) -> CheckoutOutcome {
    match error {
        CheckoutError::EmptyCart => CheckoutOutcome::EmptyCart,
        CheckoutError::PaymentDeclined { .. } => CheckoutOutcome::Declined,
        CheckoutError::PersistFailure { .. } => CheckoutOutcome::PersistFailure,
        CheckoutError::CartNotCleared { .. } => CheckoutOutcome::Uncleared,
        _ => CheckoutOutcome::Error,
    }
}

pub(crate) fn into_status_error(error: CheckoutError) -> StatusError {
    match error {
        CheckoutError::EmptyCart => StatusError::not_found().brief("Cart is empty"),
        CheckoutError::PaymentDeclined { attempt } => StatusError::payment_required()
            .brief(format!("Payment declined (attempt {attempt})")),
        CheckoutError::PersistFailure {
            attempt,
            compensated,
        } => {
            error!(
                attempt_uuid = %attempt,
                compensated,
                "order not saved after payment"
            );

            StatusError::internal_server_error().brief(format!(
                "Order could not be saved (attempt {attempt}, refunded: {compensated})"
            ))
        }
        CheckoutError::CartNotCleared { attempt, order } => {
            error!(attempt_uuid = %attempt, order_uuid = %order, "order placed, cart not cleared");

            StatusError::internal_server_error().brief(format!(
                "Order {order} was placed but the cart could not be cleared; \
                 checking out again finishes it (attempt {attempt})"
            ))
        }
        CheckoutError::NotCompensable { attempt, state } => StatusError::conflict()
            .brief(format!("Checkout attempt {attempt} is {state}")),
        CheckoutError::Cart(source) => crate::carts::into_status_error(source),
        CheckoutError::Order(source) => crate::orders::into_status_error(source),
        source @ (CheckoutError::Interrupted { .. }
        | CheckoutError::RefundRefused { .. }
        | CheckoutError::Payment(_)
        | CheckoutError::Attempts(_)) => {
            error!(error = %source, "checkout failed");

            StatusError::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use shopfront_app::domain::{checkout::records::AttemptUuid, orders::records::OrderUuid};

    use super::*;

    #[test]
    fn persist_failure_names_the_attempt() {
        let attempt = AttemptUuid::new();

        let status = into_status_error(CheckoutError::PersistFailure {
            attempt,
            compensated: true,
        });

        assert_eq!(status.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            status.brief.contains(&attempt.to_string()),
            "brief should carry the attempt uuid"
        );
        assert!(
            status.brief.contains("refunded: true"),
            "brief should say whether the payment was refunded"
        );
    }

    #[test]
    fn uncleared_cart_names_the_placed_order() {
        let attempt = AttemptUuid::new();
        let order = OrderUuid::new();

        let status = into_status_error(CheckoutError::CartNotCleared { attempt, order });

        assert_eq!(status.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            status.brief.contains(&order.to_string()),
            "brief should carry the order uuid"
        );
        assert_eq!(
            outcome_of(&CheckoutError::CartNotCleared { attempt, order }),
            CheckoutOutcome::Uncleared
        );
    }

    #[test]
    fn outcomes_follow_the_error() {
        let attempt = AttemptUuid::new();

        assert_eq!(outcome_of(&CheckoutError::EmptyCart), CheckoutOutcome::EmptyCart);
        assert_eq!(
            outcome_of(&CheckoutError::PaymentDeclined { attempt }),
            CheckoutOutcome::Declined
        );
        assert_eq!(
            outcome_of(&CheckoutError::Interrupted { attempt }),
            CheckoutOutcome::Error
        );
    }
}
