//! Cart mutations and total recomputation.

use std::sync::Arc;

use tracing::warn;

use crate::domain::{
    carts::{
        actions::CartAction,
        errors::CartsServiceError,
        records::{CartRecord, CartUuid},
        store::CartStore,
    },
    products::{ProductCatalog, records::ProductUuid},
};

/// Applies line changes to a cart and keeps its cached total in step.
///
/// Nothing here takes the cart lock; callers serialize writers per cart.
#[derive(Clone)]
pub struct CartMutator {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
}

impl std::fmt::Debug for CartMutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartMutator").finish_non_exhaustive()
    }
}

impl CartMutator {
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// Returns [`CartsServiceError::ProductNotFound`] without touching the cart
    /// if the product is not in the catalog.
    pub async fn add_item(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        self.catalog.find_by_id(product).await?;

        self.store.increment_line(cart, product).await?;

        self.recompute(cart).await
    }

    /// Remove one unit of `product`. Absent products are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or catalog fails.
    pub async fn remove_one(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        self.store.decrement_line(cart, product).await?;

        self.recompute(cart).await
    }

    /// Remove every unit of `product`. Absent products are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or catalog fails.
    pub async fn remove_all(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        self.store.delete_line(cart, product).await?;

        self.recompute(cart).await
    }

    /// Empty the cart and reset its total.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn clear(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError> {
        self.store.clear_lines(cart).await?;

        self.store.set_total(cart, 0).await
    }

    /// Dispatch a parsed [`CartAction`].
    ///
    /// # Errors
    ///
    /// See [`Self::add_item`], [`Self::remove_one`] and [`Self::remove_all`].
    pub async fn apply(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        action: CartAction,
    ) -> Result<CartRecord, CartsServiceError> {
        match action {
            CartAction::Plus => self.add_item(cart, product).await,
            CartAction::Minus => self.remove_one(cart, product).await,
            CartAction::Delete => self.remove_all(cart, product).await,
        }
    }

    /// Re-derive the total from current lines and catalog prices, then persist it.
    ///
    /// # Errors
    ///
    /// Returns [`CartsServiceError::InvalidData`] if the total overflows.
    pub async fn recompute(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError> {
        let record = self.store.get_cart(cart).await?;

        let uuids: Vec<ProductUuid> = record.lines.iter().map(|line| line.product_uuid).collect();

        let products = self.catalog.find_many(&uuids).await?;

        let mut total: u64 = 0;

        for line in &record.lines {
            let Some(product) = products.iter().find(|p| p.uuid == line.product_uuid) else {
                warn!(
                    cart = %cart,
                    product = %line.product_uuid,
                    "cart line references a product missing from the catalog"
                );

                continue;
            };

            total = product
                .price
                .checked_mul(line.quantity)
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or(CartsServiceError::InvalidData)?;
        }

        self.store.set_total(cart, total).await
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::domain::{
        carts::{memory::InMemoryCartStore, store::MockCartStore},
        products::{
            MockProductCatalog, data::NewProduct, memory::InMemoryProductCatalog,
            records::ProductRecord,
        },
        users::UserUuid,
    };

    struct Fixture {
        mutator: CartMutator,
        store: Arc<InMemoryCartStore>,
        catalog: Arc<InMemoryProductCatalog>,
        cart: CartUuid,
    }

    async fn fixture() -> TestResult<Fixture> {
        let store = Arc::new(InMemoryCartStore::new());
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let cart = store.find_or_create_for_user(UserUuid::new()).await?.uuid;

        Ok(Fixture {
            mutator: CartMutator::new(store.clone(), catalog.clone()),
            store,
            catalog,
            cart,
        })
    }

    async fn product(catalog: &InMemoryProductCatalog, price: u64) -> TestResult<ProductRecord> {
        Ok(catalog
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                name: format!("Product {price}"),
                price,
                description: String::new(),
                image_path: None,
            })
            .await?)
    }

    #[tokio::test]
    async fn plus_twice_then_minus_then_delete() -> TestResult {
        let Fixture {
            mutator, catalog, cart, ..
        } = fixture().await?;
        let p1 = product(&catalog, 10_00).await?;

        mutator.apply(cart, p1.uuid, CartAction::Plus).await?;
        let record = mutator.apply(cart, p1.uuid, CartAction::Plus).await?;

        assert_eq!(record.total_price, 20_00);
        assert_eq!(record.quantity_of(p1.uuid), 2);

        let record = mutator.apply(cart, p1.uuid, CartAction::Minus).await?;

        assert_eq!(record.total_price, 10_00);
        assert_eq!(record.quantity_of(p1.uuid), 1);

        let record = mutator.apply(cart, p1.uuid, CartAction::Delete).await?;

        assert_eq!(record.total_price, 0);
        assert!(record.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn add_unknown_product_has_no_side_effect() -> TestResult {
        let Fixture {
            mutator, store, cart, ..
        } = fixture().await?;

        let result = mutator.add_item(cart, ProductUuid::new()).await;

        assert!(
            matches!(result, Err(CartsServiceError::ProductNotFound)),
            "expected ProductNotFound, got {result:?}"
        );
        assert!(store.get_cart(cart).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn remove_one_of_absent_product_is_noop() -> TestResult {
        let Fixture {
            mutator, catalog, cart, ..
        } = fixture().await?;
        let p1 = product(&catalog, 10_00).await?;
        let p2 = product(&catalog, 5_00).await?;

        mutator.add_item(cart, p1.uuid).await?;

        let record = mutator.remove_one(cart, p2.uuid).await?;

        assert_eq!(record.total_price, 10_00);
        assert_eq!(record.quantity_of(p1.uuid), 1);

        Ok(())
    }

    #[tokio::test]
    async fn remove_all_twice_equals_once() -> TestResult {
        let Fixture {
            mutator, catalog, cart, ..
        } = fixture().await?;
        let p1 = product(&catalog, 10_00).await?;
        let p2 = product(&catalog, 5_00).await?;

        mutator.add_item(cart, p1.uuid).await?;
        mutator.add_item(cart, p2.uuid).await?;
        mutator.add_item(cart, p2.uuid).await?;

        let once = mutator.remove_all(cart, p2.uuid).await?;
        let twice = mutator.remove_all(cart, p2.uuid).await?;

        assert_eq!(once.lines, twice.lines);
        assert_eq!(once.total_price, 10_00);
        assert_eq!(twice.total_price, 10_00);

        Ok(())
    }

    #[tokio::test]
    async fn total_tracks_every_mutation() -> TestResult {
        let Fixture {
            mutator, catalog, cart, ..
        } = fixture().await?;
        let products = [
            product(&catalog, 10_00).await?,
            product(&catalog, 5_00).await?,
            product(&catalog, 1_99).await?,
        ];

        let mut record = mutator.clear(cart).await?;

        for (step, target) in products.iter().cycle().take(30).enumerate() {
            let action = match step % 5 {
                0 | 1 | 3 => CartAction::Plus,
                2 => CartAction::Minus,
                _ => CartAction::Delete,
            };

            record = mutator.apply(cart, target.uuid, action).await?;

            let expected: u64 = record
                .lines
                .iter()
                .map(|line| {
                    products
                        .iter()
                        .find(|p| p.uuid == line.product_uuid)
                        .map_or(0, |p| p.price * line.quantity)
                })
                .sum();

            assert_eq!(record.total_price, expected, "after step {step}");
        }

        Ok(())
    }

    #[tokio::test]
    async fn recompute_uses_fresh_prices() -> TestResult {
        let Fixture {
            mutator, catalog, cart, ..
        } = fixture().await?;
        let p1 = product(&catalog, 10_00).await?;

        mutator.add_item(cart, p1.uuid).await?;
        catalog.set_price(p1.uuid, 12_00).await?;

        let record = mutator.recompute(cart).await?;

        assert_eq!(record.total_price, 12_00);

        Ok(())
    }

    #[tokio::test]
    async fn missing_catalog_product_contributes_nothing() -> TestResult {
        let store = Arc::new(InMemoryCartStore::new());
        let cart = store.find_or_create_for_user(UserUuid::new()).await?.uuid;
        let orphan = ProductUuid::new();

        store.increment_line(cart, orphan).await?;

        let mut catalog = MockProductCatalog::new();

        catalog
            .expect_find_many()
            .once()
            .returning(|_| Ok(Vec::new()));

        let mutator = CartMutator::new(store, Arc::new(catalog));

        let record = mutator.recompute(cart).await?;

        assert_eq!(record.total_price, 0);
        assert_eq!(record.quantity_of(orphan), 1);

        Ok(())
    }

    #[tokio::test]
    async fn clear_resets_lines_and_total() -> TestResult {
        let cart = CartUuid::new();

        let mut store = MockCartStore::new();

        store
            .expect_clear_lines()
            .once()
            .withf(move |uuid| *uuid == cart)
            .returning(|_| Ok(3));

        store
            .expect_set_total()
            .once()
            .withf(move |uuid, total| *uuid == cart && *total == 0)
            .returning(|uuid, total| {
                Ok(CartRecord {
                    uuid,
                    user_uuid: UserUuid::new(),
                    total_price: total,
                    lines: Vec::new(),
                    created_at: jiff::Timestamp::UNIX_EPOCH,
                    updated_at: jiff::Timestamp::UNIX_EPOCH,
                })
            });

        let mutator = CartMutator::new(Arc::new(store), Arc::new(MockProductCatalog::new()));

        let record = mutator.clear(cart).await?;

        assert!(record.is_empty());
        assert_eq!(record.total_price, 0);

        Ok(())
    }
}
