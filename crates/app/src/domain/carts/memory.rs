//! In-memory cart store.

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

use crate::domain::{
    carts::{
        errors::CartsServiceError,
        records::{CartLineRecord, CartRecord, CartUuid},
        store::CartStore,
    },
    products::records::ProductUuid,
    users::UserUuid,
};

#[derive(Debug, Default)]
struct Carts {
    carts: FxHashMap<CartUuid, CartRecord>,
    by_user: FxHashMap<UserUuid, CartUuid>,
}

impl Carts {
    fn cart_mut(&mut self, cart: CartUuid) -> Result<&mut CartRecord, CartsServiceError> {
        self.carts.get_mut(&cart).ok_or(CartsServiceError::NotFound)
    }
}

/// Cart store held in process memory, used for local development and tests.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    state: Mutex<Carts>,
}

impl InMemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn find_or_create_for_user(
        &self,
        user: UserUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut state = self.state.lock().await;

        if let Some(cart) = state.by_user.get(&user).copied() {
            return state.cart_mut(cart).map(|record| record.clone());
        }

        let now = Timestamp::now();

        let cart = CartRecord {
            uuid: CartUuid::new(),
            user_uuid: user,
            total_price: 0,
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        state.by_user.insert(user, cart.uuid);
        state.carts.insert(cart.uuid, cart.clone());

        Ok(cart)
    }

    async fn get_cart(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError> {
        self.state
            .lock()
            .await
            .cart_mut(cart)
            .map(|record| record.clone())
    }

    async fn increment_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<u64, CartsServiceError> {
        let mut state = self.state.lock().await;
        let record = state.cart_mut(cart)?;

        if let Some(line) = record
            .lines
            .iter_mut()
            .find(|line| line.product_uuid == product)
        {
            line.quantity += 1;

            return Ok(line.quantity);
        }

        record.lines.push(CartLineRecord {
            cart_uuid: cart,
            product_uuid: product,
            quantity: 1,
        });

        Ok(1)
    }

    async fn decrement_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<Option<u64>, CartsServiceError> {
        let mut state = self.state.lock().await;
        let record = state.cart_mut(cart)?;

        let Some(position) = record
            .lines
            .iter()
            .position(|line| line.product_uuid == product)
        else {
            return Ok(None);
        };

        let remaining = record
            .lines
            .get_mut(position)
            .map_or(0, |line| {
                line.quantity = line.quantity.saturating_sub(1);
                line.quantity
            });

        if remaining == 0 {
            record.lines.remove(position);
        }

        Ok(Some(remaining))
    }

    async fn delete_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<u64, CartsServiceError> {
        let mut state = self.state.lock().await;
        let record = state.cart_mut(cart)?;

        let mut removed = 0;

        record.lines.retain(|line| {
            if line.product_uuid == product {
                removed += line.quantity;
                return false;
            }

            true
        });

        Ok(removed)
    }

    async fn clear_lines(&self, cart: CartUuid) -> Result<u64, CartsServiceError> {
        let mut state = self.state.lock().await;
        let record = state.cart_mut(cart)?;

        let removed = record.lines.len() as u64;

        record.lines.clear();

        Ok(removed)
    }

    async fn set_total(&self, cart: CartUuid, total: u64) -> Result<CartRecord, CartsServiceError> {
        let mut state = self.state.lock().await;
        let record = state.cart_mut(cart)?;

        record.total_price = total;
        record.updated_at = Timestamp::now();

        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn cart_is_created_once_per_user() -> TestResult {
        let store = InMemoryCartStore::new();
        let user = UserUuid::new();

        let first = store.find_or_create_for_user(user).await?;
        let second = store.find_or_create_for_user(user).await?;

        assert_eq!(first.uuid, second.uuid);
        assert_eq!(first.user_uuid, user);
        assert_eq!(first.total_price, 0);
        assert!(first.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn different_users_get_different_carts() -> TestResult {
        let store = InMemoryCartStore::new();

        let first = store.find_or_create_for_user(UserUuid::new()).await?;
        let second = store.find_or_create_for_user(UserUuid::new()).await?;

        assert_ne!(first.uuid, second.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn increment_and_decrement_track_quantity() -> TestResult {
        let store = InMemoryCartStore::new();
        let cart = store.find_or_create_for_user(UserUuid::new()).await?.uuid;
        let product = ProductUuid::new();

        assert_eq!(store.increment_line(cart, product).await?, 1);
        assert_eq!(store.increment_line(cart, product).await?, 2);
        assert_eq!(store.decrement_line(cart, product).await?, Some(1));
        assert_eq!(store.decrement_line(cart, product).await?, Some(0));
        assert_eq!(store.decrement_line(cart, product).await?, None);

        assert!(store.get_cart(cart).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn delete_line_reports_removed_units() -> TestResult {
        let store = InMemoryCartStore::new();
        let cart = store.find_or_create_for_user(UserUuid::new()).await?.uuid;
        let product = ProductUuid::new();

        store.increment_line(cart, product).await?;
        store.increment_line(cart, product).await?;

        assert_eq!(store.delete_line(cart, product).await?, 2);
        assert_eq!(store.delete_line(cart, product).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_cart_returns_not_found() {
        let store = InMemoryCartStore::new();

        let result = store.increment_line(CartUuid::new(), ProductUuid::new()).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
