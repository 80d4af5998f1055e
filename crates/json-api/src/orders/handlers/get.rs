//! Get Order Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopfront_app::domain::orders::records::{OrderLineRecord, OrderRecord};

use crate::{extensions::*, orders::into_status_error, state::State};

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    /// The unique identifier of the order
    pub uuid: Uuid,

    /// Human readable order reference
    pub number: String,

    /// The date and time the order was placed
    pub order_date: String,

    /// Amount charged in pence/cents
    pub total_sum: u64,

    /// The checkout attempt that produced the order
    pub attempt_uuid: Uuid,

    /// The products bought
    pub lines: Vec<OrderLineResponse>,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        OrderResponse {
            uuid: order.uuid.into_uuid(),
            number: order.number,
            order_date: order.order_date.to_string(),
            total_sum: order.total_sum,
            attempt_uuid: order.attempt_uuid.into_uuid(),
            lines: order.lines.into_iter().map(OrderLineResponse::from).collect(),
        }
    }
}

/// Order Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderLineResponse {
    /// The product bought
    pub product_uuid: Uuid,

    /// Units bought
    pub quantity: u64,

    /// Price charged per unit in pence/cents
    pub unit_price: u64,

    /// Unit price times quantity
    pub subtotal: u64,
}

impl From<OrderLineRecord> for OrderLineResponse {
    fn from(line: OrderLineRecord) -> Self {
        Self {
            subtotal: line.unit_price.saturating_mul(line.quantity),
            product_uuid: line.product_uuid.into_uuid(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// Get Order Handler
///
/// Returns one of the caller's orders.
#[endpoint(
    tags("orders"),
    summary = "Get Order",
    responses(
        (status_code = StatusCode::OK, description = "Order found"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing or invalid X-User-Uuid"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let order = state
        .app
        .orders
        .get_order(user, order.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use shopfront_app::domain::{
        orders::{MockOrderStore, OrdersServiceError, records::OrderUuid},
        products::records::ProductUuid,
    };

    use crate::test_helpers::{TEST_USER_UUID, make_order, orders_service};

    use super::*;

    fn make_service(orders: MockOrderStore) -> Service {
        orders_service(orders, Router::with_path("orders/{order}").get(handler))
    }

    #[tokio::test]
    async fn test_get_returns_order_with_lines() -> TestResult {
        let mut orders = MockOrderStore::new();
        let uuid = OrderUuid::new();
        let product = ProductUuid::new();
        let order = make_order(uuid, &[(product, 2, 5_00)]);

        orders
            .expect_get_order()
            .once()
            .withf(move |user, o| *user == TEST_USER_UUID && *o == uuid)
            .return_once(move |_, _| Ok(order));

        let mut res = TestClient::get(format!("http://example.com/orders/{uuid}"))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(body.total_sum, 10_00);

        let line = body.lines.first().ok_or("missing order line")?;

        assert_eq!(line.product_uuid, product.into_uuid());
        assert_eq!(line.subtotal, 10_00);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_other_users_order_returns_404() -> TestResult {
        let mut orders = MockOrderStore::new();
        let uuid = OrderUuid::new();

        orders
            .expect_get_order()
            .once()
            .return_once(|_, _| Err(OrdersServiceError::NotFound));

        let res = TestClient::get(format!("http://example.com/orders/{uuid}"))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
