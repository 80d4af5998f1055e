//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::Span;

use crate::domain::{
    carts::{
        actions::CartAction,
        errors::CartsServiceError,
        locks::CartLocks,
        mutator::CartMutator,
        records::CartRecord,
        store::CartStore,
        view::{CartAggregator, CartView},
    },
    products::{ProductCatalog, records::ProductUuid},
    users::UserUuid,
};

/// Carts service backed by a [`CartStore`], serializing writers per cart.
#[derive(Clone)]
pub struct StoreCartsService {
    store: Arc<dyn CartStore>,
    mutator: CartMutator,
    aggregator: CartAggregator,
    locks: CartLocks,
}

impl std::fmt::Debug for StoreCartsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCartsService")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl StoreCartsService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn ProductCatalog>,
        locks: CartLocks,
    ) -> Self {
        Self {
            mutator: CartMutator::new(Arc::clone(&store), Arc::clone(&catalog)),
            aggregator: CartAggregator::new(Arc::clone(&store), catalog),
            store,
            locks,
        }
    }

    async fn mutate(
        &self,
        user: UserUuid,
        product: ProductUuid,
        action: CartAction,
    ) -> Result<CartView, CartsServiceError> {
        let cart = self.store.find_or_create_for_user(user).await?;

        Span::current().record("cart_uuid", tracing::field::display(cart.uuid));

        let _guard = self.locks.lock(cart.uuid).await;

        let record = self.mutator.apply(cart.uuid, product, action).await?;

        self.aggregator.aggregate(record).await
    }
}

#[async_trait]
impl CartsService for StoreCartsService {
    #[tracing::instrument(name = "carts.service.cart_for_user", skip(self), fields(user_uuid = %user), err)]
    async fn cart_for_user(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError> {
        self.store.find_or_create_for_user(user).await
    }

    #[tracing::instrument(name = "carts.service.view_for_user", skip(self), fields(user_uuid = %user), err)]
    async fn view_for_user(&self, user: UserUuid) -> Result<CartView, CartsServiceError> {
        let cart = self.store.find_or_create_for_user(user).await?;

        self.aggregator.aggregate(cart).await
    }

    #[tracing::instrument(
        name = "carts.service.apply_action",
        skip(self),
        fields(
            user_uuid = %user,
            product_uuid = %product,
            cart_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn apply_action(
        &self,
        user: UserUuid,
        product: ProductUuid,
        action: &str,
    ) -> Result<CartView, CartsServiceError> {
        let action: CartAction = action.parse()?;

        self.mutate(user, product, action).await
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self),
        fields(user_uuid = %user, product_uuid = %product, cart_uuid = tracing::field::Empty),
        err
    )]
    async fn add_item(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<CartView, CartsServiceError> {
        self.mutate(user, product, CartAction::Plus).await
    }

    #[tracing::instrument(
        name = "carts.service.remove_one",
        skip(self),
        fields(user_uuid = %user, product_uuid = %product, cart_uuid = tracing::field::Empty),
        err
    )]
    async fn remove_one(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<CartView, CartsServiceError> {
        self.mutate(user, product, CartAction::Minus).await
    }

    #[tracing::instrument(
        name = "carts.service.remove_all",
        skip(self),
        fields(user_uuid = %user, product_uuid = %product, cart_uuid = tracing::field::Empty),
        err
    )]
    async fn remove_all(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<CartView, CartsServiceError> {
        self.mutate(user, product, CartAction::Delete).await
    }
}

#[automock]
#[async_trait]
/// Cart operations for a resolved user.
pub trait CartsService: Send + Sync {
    /// Return the user's cart, creating it on first access.
    async fn cart_for_user(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError>;

    /// Return the user's cart joined against the catalog.
    async fn view_for_user(&self, user: UserUuid) -> Result<CartView, CartsServiceError>;

    /// Parse `action` (`plus`, `minus` or `delete`) and apply it.
    ///
    /// An unrecognised token fails with [`CartsServiceError::InvalidAction`]
    /// before any storage is touched.
    async fn apply_action(
        &self,
        user: UserUuid,
        product: ProductUuid,
        action: &str,
    ) -> Result<CartView, CartsServiceError>;

    /// Add one unit of `product`.
    async fn add_item(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<CartView, CartsServiceError>;

    /// Remove one unit of `product`.
    async fn remove_one(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<CartView, CartsServiceError>;

    /// Remove every unit of `product`.
    async fn remove_all(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<CartView, CartsServiceError>;
}
