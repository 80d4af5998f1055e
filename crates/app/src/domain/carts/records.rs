//! Cart Records

use jiff::Timestamp;

use crate::{
    domain::{products::records::ProductUuid, users::UserUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRecord {
    pub uuid: CartUuid,
    pub user_uuid: UserUuid,

    /// Cached sum of `quantity * price` over `lines`, in minor currency units.
    pub total_price: u64,
    pub lines: Vec<CartLineRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartRecord {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Units of `product` currently in the cart.
    #[must_use]
    pub fn quantity_of(&self, product: ProductUuid) -> u64 {
        self.lines
            .iter()
            .find(|line| line.product_uuid == product)
            .map_or(0, |line| line.quantity)
    }
}

/// Cart Line Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineRecord {
    pub cart_uuid: CartUuid,
    pub product_uuid: ProductUuid,

    /// Always at least one; a line is deleted rather than reaching zero.
    pub quantity: u64,
}
