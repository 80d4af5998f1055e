//! App Router

use salvo::Router;

use crate::{carts, checkout, identity, orders, products};

pub(crate) fn app_router() -> Router {
    Router::new()
        .push(
            Router::with_path("products")
                .get(products::index::handler)
                .push(Router::with_path("{product}").get(products::get::handler)),
        )
        .push(
            Router::new()
                .hoop(identity::middleware::handler)
                .push(
                    Router::with_path("cart")
                        .get(carts::get::handler)
                        .push(
                            Router::with_path("items")
                                .post(carts::items::create::handler)
                                .push(
                                    Router::with_path("{product}")
                                        .delete(carts::items::delete::handler),
                                ),
                        )
                        .push(
                            Router::with_path("payment-status")
                                .get(carts::payment_status::handler),
                        ),
                )
                .push(Router::with_path("checkout").post(checkout::create::handler))
                .push(
                    Router::with_path("orders")
                        .get(orders::index::handler)
                        .push(Router::with_path("{order}").get(orders::get::handler)),
                ),
        )
}
