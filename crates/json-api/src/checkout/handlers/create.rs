//! Create Checkout Handler

use std::sync::Arc;

use salvo::{http::header::LOCATION, prelude::*};

use crate::{
    checkout::{into_status_error, outcome_of},
    extensions::*,
    observability::{CheckoutOutcome, record_checkout_outcome},
    orders::get::OrderResponse,
    state::State,
};

/// Create Checkout Handler
///
/// Charges the caller for their cart and turns it into an order. The cart is
/// emptied on success and left untouched otherwise.
#[endpoint(
    tags("checkout"),
    summary = "Checkout",
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart is empty"),
        (status_code = StatusCode::PAYMENT_REQUIRED, description = "Payment declined or not confirmed"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing or invalid X-User-Uuid"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Order not saved after payment, or saved with the cart left uncleared"),
    ),
)]
pub(crate) async fn handler(
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let order = match state.app.checkout.process_order(user).await {
        Ok(order) => order,
        Err(error) => {
            record_checkout_outcome(outcome_of(&error));

            return Err(into_status_error(error));
        }
    };

    record_checkout_outcome(CheckoutOutcome::Committed);

    res.add_header(LOCATION, format!("/orders/{}", order.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use shopfront_app::domain::{
        checkout::{CheckoutError, MockCheckoutService, records::AttemptUuid},
        orders::records::OrderUuid,
        products::records::ProductUuid,
    };

    use crate::test_helpers::{TEST_USER_UUID, checkout_service, make_order};

    use super::*;

    fn make_service(checkout: MockCheckoutService) -> Service {
        checkout_service(checkout, Router::with_path("checkout").post(handler))
    }

    #[tokio::test]
    async fn test_checkout_returns_201_with_location() -> TestResult {
        let mut checkout = MockCheckoutService::new();
        let uuid = OrderUuid::new();
        let order = make_order(uuid, &[(ProductUuid::new(), 2, 5_00)]);

        checkout
            .expect_process_order()
            .once()
            .withf(|user| *user == TEST_USER_UUID)
            .return_once(move |_| Ok(order));

        let mut res = TestClient::post("http://example.com/checkout")
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        let location = res
            .headers()
            .get(LOCATION)
            .ok_or("missing location header")?
            .to_str()?
            .to_string();

        assert_eq!(location, format!("/orders/{uuid}"));

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(body.total_sum, 10_00);

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_cart_returns_404() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_process_order()
            .once()
            .return_once(|_| Err(CheckoutError::EmptyCart));

        let res = TestClient::post("http://example.com/checkout")
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_declined_payment_returns_402() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout.expect_process_order().once().return_once(|_| {
            Err(CheckoutError::PaymentDeclined {
                attempt: AttemptUuid::new(),
            })
        });

        let res = TestClient::post("http://example.com/checkout")
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::PAYMENT_REQUIRED));

        Ok(())
    }

    #[tokio::test]
    async fn test_persist_failure_returns_500_with_attempt() -> TestResult {
        let mut checkout = MockCheckoutService::new();
        let attempt = AttemptUuid::new();

        checkout.expect_process_order().once().return_once(move |_| {
            Err(CheckoutError::PersistFailure {
                attempt,
                compensated: false,
            })
        });

        let mut res = TestClient::post("http://example.com/checkout")
            .add_header("accept", "application/json", true)
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        let body = res.take_string().await?;

        assert!(
            body.contains(&attempt.to_string()),
            "error body should carry the attempt uuid: {body}"
        );

        Ok(())
    }
}
