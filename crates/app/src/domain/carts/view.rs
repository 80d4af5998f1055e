//! Aggregated cart view.

use std::sync::Arc;

use tracing::warn;

use crate::domain::{
    carts::{
        errors::CartsServiceError,
        records::{CartRecord, CartUuid},
        store::CartStore,
    },
    products::{ProductCatalog, records::ProductRecord},
};

/// One unique product in a cart with its quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartViewLine {
    pub product: ProductRecord,
    pub quantity: u64,
}

impl CartViewLine {
    /// `price * quantity`, or `None` on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Option<u64> {
        self.product.price.checked_mul(self.quantity)
    }
}

/// A cart joined against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub cart: CartRecord,
    pub lines: Vec<CartViewLine>,

    /// The cart's stored total.
    pub total: u64,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `price * quantity` over the joined products at the moment they were read.
    ///
    /// # Errors
    ///
    /// Returns [`CartsServiceError::InvalidData`] if the sum overflows.
    pub fn live_total(&self) -> Result<u64, CartsServiceError> {
        self.lines.iter().try_fold(0_u64, |total, line| {
            line.subtotal()
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or(CartsServiceError::InvalidData)
        })
    }
}

/// Read-only join of cart lines with catalog products.
#[derive(Clone)]
pub struct CartAggregator {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
}

impl std::fmt::Debug for CartAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartAggregator").finish_non_exhaustive()
    }
}

impl CartAggregator {
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Load `cart` and join its lines against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CartsServiceError::NotFound`] for an unknown cart, or an error
    /// if the store or catalog fails.
    pub async fn get_aggregated(&self, cart: CartUuid) -> Result<CartView, CartsServiceError> {
        let record = self.store.get_cart(cart).await?;

        self.aggregate(record).await
    }

    /// Join an already loaded cart against the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails.
    pub async fn aggregate(&self, cart: CartRecord) -> Result<CartView, CartsServiceError> {
        let uuids: Vec<_> = cart.lines.iter().map(|line| line.product_uuid).collect();

        let mut products = self.catalog.find_many(&uuids).await?;

        let mut lines = Vec::with_capacity(cart.lines.len());

        for line in &cart.lines {
            let Some(position) = products.iter().position(|p| p.uuid == line.product_uuid) else {
                warn!(
                    cart = %cart.uuid,
                    product = %line.product_uuid,
                    "skipping cart line for a product missing from the catalog"
                );

                continue;
            };

            lines.push(CartViewLine {
                product: products.swap_remove(position),
                quantity: line.quantity,
            });
        }

        Ok(CartView {
            total: cart.total_price,
            cart,
            lines,
        })
    }
}
