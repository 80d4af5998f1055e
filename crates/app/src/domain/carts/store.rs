//! Cart store.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            records::{CartRecord, CartUuid},
            repositories::{PgCartLinesRepository, PgCartsRepository},
        },
        products::records::ProductUuid,
        users::UserUuid,
    },
};

/// Persistence for carts and their lines.
///
/// Every method is atomic on its own; callers that need several calls to
/// appear atomic must hold the cart's lock.
#[automock]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Return the user's cart, creating an empty one on first access.
    async fn find_or_create_for_user(&self, user: UserUuid)
    -> Result<CartRecord, CartsServiceError>;

    /// Retrieve a cart together with its lines.
    async fn get_cart(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError>;

    /// Add one unit of `product`, returning the new quantity.
    async fn increment_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<u64, CartsServiceError>;

    /// Remove one unit of `product`, deleting the line when it reaches zero.
    ///
    /// Returns the remaining quantity, or `None` if there was no line.
    async fn decrement_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<Option<u64>, CartsServiceError>;

    /// Delete the line for `product`, returning how many units it held.
    async fn delete_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<u64, CartsServiceError>;

    /// Delete every line, returning how many lines were removed.
    async fn clear_lines(&self, cart: CartUuid) -> Result<u64, CartsServiceError>;

    /// Persist a recomputed total and return the cart with its lines.
    async fn set_total(&self, cart: CartUuid, total: u64) -> Result<CartRecord, CartsServiceError>;
}

#[derive(Debug, Clone)]
pub struct PgCartStore {
    db: Db,
    carts_repository: PgCartsRepository,
    lines_repository: PgCartLinesRepository,
}

impl PgCartStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts_repository: PgCartsRepository::new(),
            lines_repository: PgCartLinesRepository::new(),
        }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn find_or_create_for_user(
        &self,
        user: UserUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let mut cart = self
            .carts_repository
            .find_or_create_for_user(&mut tx, CartUuid::new(), user)
            .await?;

        let lines = self
            .lines_repository
            .get_cart_lines(&mut tx, cart.uuid)
            .await?;

        tx.commit().await?;

        cart.lines.extend(lines);

        Ok(cart)
    }

    async fn get_cart(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let mut record = self.carts_repository.get_cart(&mut tx, cart).await?;

        let lines = self.lines_repository.get_cart_lines(&mut tx, cart).await?;

        tx.commit().await?;

        record.lines.extend(lines);

        Ok(record)
    }

    async fn increment_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<u64, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let quantity = self
            .lines_repository
            .increment_cart_line(&mut tx, cart, product)
            .await?;

        tx.commit().await?;

        Ok(quantity)
    }

    async fn decrement_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<Option<u64>, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let remaining = self
            .lines_repository
            .decrement_cart_line(&mut tx, cart, product)
            .await?;

        let remaining = match remaining {
            Some(quantity) => Some(quantity),
            None => self
                .lines_repository
                .delete_last_unit(&mut tx, cart, product)
                .await?
                .then_some(0),
        };

        tx.commit().await?;

        Ok(remaining)
    }

    async fn delete_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<u64, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let removed = self
            .lines_repository
            .delete_cart_line(&mut tx, cart, product)
            .await?;

        tx.commit().await?;

        Ok(removed.unwrap_or(0))
    }

    async fn clear_lines(&self, cart: CartUuid) -> Result<u64, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let removed = self.lines_repository.clear_cart_lines(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(removed)
    }

    async fn set_total(&self, cart: CartUuid, total: u64) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let mut record = self
            .carts_repository
            .update_total(&mut tx, cart, total)
            .await?;

        let lines = self.lines_repository.get_cart_lines(&mut tx, cart).await?;

        tx.commit().await?;

        record.lines.extend(lines);

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::products::{ProductCatalog, data::NewProduct},
        test::TestContext,
    };

    async fn product(ctx: &TestContext, price: u64) -> TestResult<ProductUuid> {
        let product = ctx
            .products
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                name: format!("Product {price}"),
                price,
                description: String::new(),
                image_path: None,
            })
            .await?;

        Ok(product.uuid)
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn one_cart_per_user() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let first = ctx.carts.find_or_create_for_user(user).await?;
        let second = ctx.carts.find_or_create_for_user(user).await?;

        assert_eq!(first.uuid, second.uuid);
        assert_eq!(first.total_price, 0);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn quantities_move_atomically() -> TestResult {
        let ctx = TestContext::new().await;
        let cart = ctx.carts.find_or_create_for_user(UserUuid::new()).await?.uuid;
        let p1 = product(&ctx, 10_00).await?;

        assert_eq!(ctx.carts.increment_line(cart, p1).await?, 1);
        assert_eq!(ctx.carts.increment_line(cart, p1).await?, 2);
        assert_eq!(ctx.carts.decrement_line(cart, p1).await?, Some(1));
        assert_eq!(ctx.carts.decrement_line(cart, p1).await?, Some(0));
        assert_eq!(ctx.carts.decrement_line(cart, p1).await?, None);

        assert!(ctx.carts.get_cart(cart).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn unknown_product_is_rejected_by_the_database() -> TestResult {
        let ctx = TestContext::new().await;
        let cart = ctx.carts.find_or_create_for_user(UserUuid::new()).await?.uuid;

        let result = ctx.carts.increment_line(cart, ProductUuid::new()).await;

        assert!(
            matches!(result, Err(CartsServiceError::ProductNotFound)),
            "expected ProductNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn totals_and_clear_are_persisted() -> TestResult {
        let ctx = TestContext::new().await;
        let cart = ctx.carts.find_or_create_for_user(UserUuid::new()).await?.uuid;
        let p1 = product(&ctx, 10_00).await?;
        let p2 = product(&ctx, 5_00).await?;

        ctx.carts.increment_line(cart, p1).await?;
        ctx.carts.increment_line(cart, p2).await?;

        let record = ctx.carts.set_total(cart, 15_00).await?;

        assert_eq!(record.total_price, 15_00);
        assert_eq!(record.lines.len(), 2);

        assert_eq!(ctx.carts.delete_line(cart, p2).await?, 1);
        assert_eq!(ctx.carts.clear_lines(cart).await?, 1);

        let record = ctx.carts.set_total(cart, 0).await?;

        assert!(record.is_empty());
        assert_eq!(record.total_price, 0);

        Ok(())
    }
}
