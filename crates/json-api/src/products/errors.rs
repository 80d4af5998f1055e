//! Product Errors

use salvo::http::StatusError;
use tracing::error;

use shopfront_app::domain::products::ProductsServiceError;

pub(crate) fn into_status_error(error: ProductsServiceError) -> StatusError {
    match error {
        ProductsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Product already exists")
        }
        ProductsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid product payload")
        }
        ProductsServiceError::NotFound => StatusError::not_found().brief("Product not found"),
        ProductsServiceError::InvalidPrice(source) => {
            error!("stored product price is out of range: {source}");

            StatusError::internal_server_error()
        }
        ProductsServiceError::Sql(source) => {
            error!("failed to read products: {source}");

            StatusError::internal_server_error()
        }
    }
}
