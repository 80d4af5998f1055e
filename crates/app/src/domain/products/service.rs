//! Product catalog service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::products::{
        data::NewProduct,
        errors::ProductsServiceError,
        records::{ProductRecord, ProductUuid},
        repository::PgProductsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgProductCatalog {
    db: Db,
    repository: PgProductsRepository,
}

impl PgProductCatalog {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn find_by_id(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let product = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(product)
    }

    async fn find_many(
        &self,
        products: &[ProductUuid],
    ) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.db.begin().await?;

        let found = self.repository.get_products(&mut tx, products).await?;

        tx.commit().await?;

        Ok(found)
    }

    async fn search(&self, term: &str) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let products = self.repository.search_products(&mut tx, term).await?;

        tx.commit().await?;

        Ok(products)
    }

    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(created)
    }
}

/// Read access to products, plus seeding for administration.
#[automock]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Retrieve a single product.
    async fn find_by_id(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError>;

    /// Retrieve every product in `products` that exists. Unknown ids are skipped.
    async fn find_many(
        &self,
        products: &[ProductUuid],
    ) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    /// Case-insensitive name search. An empty term lists the whole catalog.
    async fn search(&self, term: &str) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    /// Creates a new product.
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError>;
}
