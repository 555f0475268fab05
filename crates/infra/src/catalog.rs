//! Product catalog: public reads, admin writes.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use storefront_auth::{Principal, require_admin};
use storefront_catalog::{NewProduct, Product, ProductPatch};
use storefront_core::{AggregateRoot, ExpectedVersion, ProductId};

use crate::error::ServiceError;
use crate::store::{ProductStore, StoreError};

pub struct CatalogService {
    products: Arc<dyn ProductStore>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    pub async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.products.list().await?)
    }

    pub async fn get(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.products.get(id).await?.ok_or_else(not_found)
    }

    pub async fn create(&self, principal: &Principal, cmd: NewProduct) -> Result<Product, ServiceError> {
        require_admin(principal)?;

        let product = cmd.into_product(ProductId::new(), Utc::now())?;
        let product = self.products.insert(product).await?;
        info!(product_id = %product.id, stock = product.stock, "product created");
        Ok(product)
    }

    /// Partial edit, written back only if nobody changed the product
    /// (including its stock) since it was read.
    pub async fn update(
        &self,
        principal: &Principal,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, ServiceError> {
        require_admin(principal)?;

        let mut product = self.products.get(id).await?.ok_or_else(not_found)?;
        let expected = ExpectedVersion::Exact(product.version());
        product.apply_patch(patch)?;

        let product = self.products.replace(product, expected).await.map_err(|e| match e {
            StoreError::NotFound => not_found(),
            StoreError::VersionConflict { .. } => {
                ServiceError::Conflict("Product was modified concurrently; retry".to_string())
            }
            other => other.into(),
        })?;

        info!(product_id = %product.id, stock = product.stock, "product updated");
        Ok(product)
    }
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("Product not found".to_string())
}
