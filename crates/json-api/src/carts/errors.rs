//! Errors

use salvo::http::StatusError;
use tracing::error;

use shopfront_app::domain::carts::CartsServiceError;

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::NotFound => StatusError::not_found().brief("Cart not found"),
        CartsServiceError::ProductNotFound => StatusError::not_found().brief("Product not found"),
        CartsServiceError::InvalidAction(token) => StatusError::bad_request()
            .brief(format!("Unrecognised cart action {token:?}; expected plus, minus or delete")),
        CartsServiceError::InvalidData => StatusError::bad_request().brief("Invalid cart data"),
        CartsServiceError::Catalog(source) => crate::products::into_status_error(source),
        CartsServiceError::Sql(source) => {
            error!("cart storage failed: {source}");

            StatusError::internal_server_error()
        }
    }
}
