//! In-memory product catalog.

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::products::{
    ProductCatalog,
    data::NewProduct,
    errors::ProductsServiceError,
    records::{ProductRecord, ProductUuid},
};

/// Catalog held in process memory, used for local development and tests.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<FxHashMap<ProductUuid, ProductRecord>>,
}

impl InMemoryProductCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Change a product's price in place.
    ///
    /// # Errors
    ///
    /// Returns [`ProductsServiceError::NotFound`] if the product is unknown.
    pub async fn set_price(
        &self,
        product: ProductUuid,
        price: u64,
    ) -> Result<(), ProductsServiceError> {
        let mut products = self.products.write().await;

        let record = products
            .get_mut(&product)
            .ok_or(ProductsServiceError::NotFound)?;

        record.price = price;
        record.updated_at = Timestamp::now();

        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find_by_id(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError> {
        self.products
            .read()
            .await
            .get(&product)
            .cloned()
            .ok_or(ProductsServiceError::NotFound)
    }

    async fn find_many(
        &self,
        products: &[ProductUuid],
    ) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let catalog = self.products.read().await;

        Ok(products
            .iter()
            .filter_map(|uuid| catalog.get(uuid).cloned())
            .collect())
    }

    async fn search(&self, term: &str) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let term = term.trim().to_lowercase();

        let mut found: Vec<ProductRecord> = self
            .products
            .read()
            .await
            .values()
            .filter(|product| term.is_empty() || product.name.to_lowercase().contains(&term))
            .cloned()
            .collect();

        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.uuid.cmp(&b.uuid)));

        Ok(found)
    }

    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut products = self.products.write().await;

        if products.contains_key(&product.uuid) {
            return Err(ProductsServiceError::AlreadyExists);
        }

        let now = Timestamp::now();

        let record = ProductRecord {
            uuid: product.uuid,
            name: product.name,
            price: product.price,
            description: product.description,
            image_path: product.image_path,
            created_at: now,
            updated_at: now,
        };

        products.insert(record.uuid, record.clone());

        Ok(record)
    }
}
