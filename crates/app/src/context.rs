//! App Context

use std::sync::Arc;

use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{
            CartsService, StoreCartsService, locks::CartLocks, memory::InMemoryCartStore,
            store::{CartStore, PgCartStore},
        },
        checkout::{
            CheckoutOrchestrator, CheckoutService,
            memory::InMemoryCheckoutAttemptStore,
            store::{CheckoutAttemptStore, PgCheckoutAttemptStore},
        },
        orders::{OrderStore, PgOrderStore, memory::InMemoryOrderStore},
        payments::PaymentGateway,
        products::{PgProductCatalog, ProductCatalog, memory::InMemoryProductCatalog},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrate(#[source] MigrateError),
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductCatalog>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrderStore>,
    pub checkout: Arc<dyn CheckoutService>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context from a database URL, applying pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or migrating fails.
    pub async fn from_database_url(
        url: &str,
        payments: Arc<dyn PaymentGateway>,
        currency: &str,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migrate)?;

        let db = Db::new(pool);

        Ok(Self::assemble(
            Arc::new(PgProductCatalog::new(db.clone())),
            Arc::new(PgCartStore::new(db.clone())),
            Arc::new(PgOrderStore::new(db.clone())),
            Arc::new(PgCheckoutAttemptStore::new(db)),
            payments,
            currency,
        ))
    }

    /// Build application context over process-local stores.
    #[must_use]
    pub fn in_memory(payments: Arc<dyn PaymentGateway>, currency: &str) -> Self {
        Self::assemble(
            Arc::new(InMemoryProductCatalog::new()),
            Arc::new(InMemoryCartStore::new()),
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemoryCheckoutAttemptStore::new()),
            payments,
            currency,
        )
    }

    fn assemble(
        products: Arc<dyn ProductCatalog>,
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        attempts: Arc<dyn CheckoutAttemptStore>,
        payments: Arc<dyn PaymentGateway>,
        currency: &str,
    ) -> Self {
        // Cart edits and checkouts must contend on the same per-cart locks.
        let locks = CartLocks::new();

        let checkout = CheckoutOrchestrator::new(
            Arc::clone(&carts),
            Arc::clone(&products),
            Arc::clone(&orders),
            attempts,
            Arc::clone(&payments),
            locks.clone(),
            currency,
        );

        Self {
            carts: Arc::new(StoreCartsService::new(carts, Arc::clone(&products), locks)),
            checkout: Arc::new(checkout),
            products,
            orders,
            payments,
        }
    }
}
