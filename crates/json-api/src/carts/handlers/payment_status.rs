//! Cart Payment Status Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{carts::into_status_error, extensions::*, state::State};

/// Advisory view of whether the caller could pay for their cart right now.
///
/// Never authoritative: checkout sends the payment regardless.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct PaymentStatusResponse {
    /// The payment service answered its health check
    pub healthy: bool,

    /// The caller's balance was read successfully
    pub balance_verified: bool,

    /// The balance covers the cart total
    pub sufficient_funds: bool,
}

/// Cart Payment Status Handler
#[endpoint(
    tags("carts"),
    summary = "Check Payment Status",
    responses(
        (status_code = StatusCode::OK, description = "Advisory payment status"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing or invalid X-User-Uuid"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<PaymentStatusResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let total = state
        .app
        .carts
        .view_for_user(user)
        .await
        .and_then(|view| view.live_total())
        .map_err(into_status_error)?;

    if !state.app.payments.health_check().await {
        return Ok(Json(PaymentStatusResponse {
            healthy: false,
            balance_verified: false,
            sufficient_funds: false,
        }));
    }

    let (balance_verified, sufficient_funds) =
        match state.app.payments.check_balance(user, total).await {
            Ok(sufficient) => (true, sufficient),
            Err(source) => {
                warn!(user_uuid = %user, error = %source, "balance check failed");

                (false, false)
            }
        };

    Ok(Json(PaymentStatusResponse {
        healthy: true,
        balance_verified,
        sufficient_funds,
    }))
}
