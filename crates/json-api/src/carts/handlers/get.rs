//! Get Cart Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopfront_app::domain::carts::view::{CartView, CartViewLine};

use crate::{
    carts::into_status_error, extensions::*, products::get::ProductResponse, state::State,
};

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    /// The unique identifier of the cart
    pub uuid: Uuid,

    /// One entry per product in the cart
    pub lines: Vec<CartLineResponse>,

    /// Running total of the cart in pence/cents
    pub total_price: u64,
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        CartResponse {
            uuid: view.cart.uuid.into_uuid(),
            lines: view.lines.into_iter().map(CartLineResponse::from).collect(),
            total_price: view.total,
        }
    }
}

/// Cart Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartLineResponse {
    /// The product as currently listed
    pub product: ProductResponse,

    /// Units of the product in the cart
    pub quantity: u64,

    /// Current price times quantity, in pence/cents
    pub subtotal: u64,
}

impl From<CartViewLine> for CartLineResponse {
    fn from(line: CartViewLine) -> Self {
        Self {
            subtotal: line.product.price.saturating_mul(line.quantity),
            quantity: line.quantity,
            product: line.product.into(),
        }
    }
}

/// Get Cart Handler
///
/// Returns the caller's cart, creating an empty one on first access.
#[endpoint(
    tags("carts"),
    summary = "Get Cart",
    responses(
        (status_code = StatusCode::OK, description = "Cart"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing or invalid X-User-Uuid"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let view = state
        .app
        .carts
        .view_for_user(user)
        .await
        .map_err(into_status_error)?;

    Ok(Json(view.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use shopfront_app::domain::{
        carts::{CartsServiceError, MockCartsService},
        products::records::ProductUuid,
    };

    use crate::test_helpers::{TEST_USER_UUID, carts_service, make_product, make_view};

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        carts_service(carts, Router::with_path("cart").get(handler))
    }

    #[tokio::test]
    async fn test_get_returns_lines_and_total() -> TestResult {
        let mut carts = MockCartsService::new();

        let p1 = make_product(ProductUuid::new(), 10_00);
        let p2 = make_product(ProductUuid::new(), 5_00);
        let view = make_view(vec![(p1, 1), (p2.clone(), 2)]);

        carts
            .expect_view_for_user()
            .once()
            .withf(|user| *user == TEST_USER_UUID)
            .return_once(move |_| Ok(view));

        let response: CartResponse = TestClient::get("http://example.com/cart")
            .send(&make_service(carts))
            .await
            .take_json()
            .await?;

        assert_eq!(response.total_price, 20_00);
        assert_eq!(response.lines.len(), 2);

        let p2_line = response
            .lines
            .iter()
            .find(|line| line.product.uuid == p2.uuid.into_uuid())
            .ok_or("missing P2 line")?;

        assert_eq!(p2_line.quantity, 2);
        assert_eq!(p2_line.subtotal, 10_00);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_storage_error_returns_500() -> TestResult {
        let mut carts = MockCartsService::new();

        carts
            .expect_view_for_user()
            .once()
            .return_once(|_| Err(CartsServiceError::Sql(sqlx::Error::PoolTimedOut)));

        let res = TestClient::get("http://example.com/cart")
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}
