//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use shopfront_app::{
    context::AppContext,
    domain::{
        carts::{
            MockCartsService,
            records::{CartLineRecord, CartRecord, CartUuid},
            view::{CartView, CartViewLine},
        },
        checkout::{MockCheckoutService, records::AttemptUuid},
        orders::{
            MockOrderStore,
            records::{OrderLineRecord, OrderRecord, OrderUuid},
        },
        payments::MockPaymentGateway,
        products::{
            MockProductCatalog,
            records::{ProductRecord, ProductUuid},
        },
        users::UserUuid,
    },
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());

#[salvo::handler]
pub(crate) async fn inject_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_user_uuid(TEST_USER_UUID);
    ctrl.call_next(req, depot, res).await;
}

/// Mocked services behind the app context. A mock with no expectations fails
/// the test on any call.
#[derive(Debug)]
pub(crate) struct Mocks {
    pub(crate) products: MockProductCatalog,
    pub(crate) carts: MockCartsService,
    pub(crate) orders: MockOrderStore,
    pub(crate) checkout: MockCheckoutService,
    pub(crate) payments: MockPaymentGateway,
}

impl Mocks {
    pub(crate) fn new() -> Self {
        Self {
            products: MockProductCatalog::new(),
            carts: MockCartsService::new(),
            orders: MockOrderStore::new(),
            checkout: MockCheckoutService::new(),
            payments: MockPaymentGateway::new(),
        }
    }

    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            products: Arc::new(self.products),
            carts: Arc::new(self.carts),
            orders: Arc::new(self.orders),
            checkout: Arc::new(self.checkout),
            payments: Arc::new(self.payments),
        })
    }

    pub(crate) fn into_service(self, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(inject_user)
                .push(route),
        )
    }
}

pub(crate) fn products_service(products: MockProductCatalog, route: Router) -> Service {
    Mocks {
        products,
        ..Mocks::new()
    }
    .into_service(route)
}

pub(crate) fn carts_service(carts: MockCartsService, route: Router) -> Service {
    Mocks {
        carts,
        ..Mocks::new()
    }
    .into_service(route)
}

pub(crate) fn orders_service(orders: MockOrderStore, route: Router) -> Service {
    Mocks {
        orders,
        ..Mocks::new()
    }
    .into_service(route)
}

pub(crate) fn checkout_service(checkout: MockCheckoutService, route: Router) -> Service {
    Mocks {
        checkout,
        ..Mocks::new()
    }
    .into_service(route)
}

pub(crate) fn make_product(uuid: ProductUuid, price: u64) -> ProductRecord {
    ProductRecord {
        uuid,
        name: format!("Product {price}"),
        price,
        description: String::new(),
        image_path: None,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

/// A view of the test user's cart holding `lines` of `(product, quantity)`.
pub(crate) fn make_view(lines: Vec<(ProductRecord, u64)>) -> CartView {
    let cart_uuid = CartUuid::new();

    let total = lines
        .iter()
        .map(|(product, quantity)| product.price * quantity)
        .sum();

    CartView {
        cart: CartRecord {
            uuid: cart_uuid,
            user_uuid: TEST_USER_UUID,
            total_price: total,
            lines: lines
                .iter()
                .map(|(product, quantity)| CartLineRecord {
                    cart_uuid,
                    product_uuid: product.uuid,
                    quantity: *quantity,
                })
                .collect(),
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        },
        lines: lines
            .into_iter()
            .map(|(product, quantity)| CartViewLine { product, quantity })
            .collect(),
        total,
    }
}

pub(crate) fn make_order(uuid: OrderUuid, lines: &[(ProductUuid, u64, u64)]) -> OrderRecord {
    OrderRecord {
        uuid,
        user_uuid: TEST_USER_UUID,
        number: "ORD-20260101-ABC123".to_string(),
        order_date: Timestamp::UNIX_EPOCH,
        total_sum: lines
            .iter()
            .map(|(_, quantity, unit_price)| quantity * unit_price)
            .sum(),
        attempt_uuid: AttemptUuid::new(),
        lines: lines
            .iter()
            .map(|&(product_uuid, quantity, unit_price)| OrderLineRecord {
                order_uuid: uuid,
                product_uuid,
                quantity,
                unit_price,
            })
            .collect(),
    }
}
