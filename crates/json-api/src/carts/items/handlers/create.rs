//! Create Cart Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    carts::{get::CartResponse, into_status_error},
    extensions::*,
    state::State,
};

/// Apply Cart Action Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartActionRequest {
    /// The product to change
    pub product_uuid: Uuid,

    /// `plus` adds one unit, `minus` removes one, `delete` removes them all
    pub action: String,
}

/// Apply Cart Action Handler
///
/// Changes the quantity of one product in the caller's cart and returns the updated cart.
#[endpoint(
    tags("carts"),
    summary = "Change Cart Item",
    responses(
        (status_code = StatusCode::OK, description = "Cart updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unrecognised action"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing or invalid X-User-Uuid"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CartActionRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let request = json.into_inner();

    let view = state
        .app
        .carts
        .apply_action(user, request.product_uuid.into(), &request.action)
        .await
        .map_err(into_status_error)?;

    Ok(Json(view.into()))
}
