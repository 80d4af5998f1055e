//! Order Records

use jiff::Timestamp;

use crate::{
    domain::{checkout::records::AttemptUuid, products::records::ProductUuid, users::UserUuid},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,

    /// Human readable order reference, unique across orders.
    pub number: String,
    pub order_date: Timestamp,

    /// Amount charged, in minor currency units. Frozen at creation.
    pub total_sum: u64,

    /// Checkout attempt that produced this order.
    pub attempt_uuid: AttemptUuid,
    pub lines: Vec<OrderLineRecord>,
}

/// Order Line Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRecord {
    pub order_uuid: OrderUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u64,

    /// Price charged per unit.
    pub unit_price: u64,
}

impl OrderLineRecord {
    /// `unit_price * quantity`, or `None` on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Option<u64> {
        self.unit_price.checked_mul(self.quantity)
    }
}
