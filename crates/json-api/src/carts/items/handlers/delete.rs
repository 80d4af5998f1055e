//! Delete Cart Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    carts::{get::CartResponse, into_status_error},
    extensions::*,
    state::State,
};

/// Delete Cart Item Handler
///
/// Removes every unit of a product from the caller's cart. Removing a product
/// that is not in the cart leaves it unchanged.
#[endpoint(
    tags("carts"),
    summary = "Remove Product From Cart",
    responses(
        (status_code = StatusCode::OK, description = "Cart updated"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing or invalid X-User-Uuid"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let view = state
        .app
        .carts
        .remove_all(user, product.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(view.into()))
}
