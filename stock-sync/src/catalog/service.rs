//! Catalog Service - product create / update / delete
//!
//! Writes go straight to the store; the synchronizer's next snapshot is
//! the only thing that changes the view.

use std::sync::Arc;

use shared::error::ErrorCode;
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::util::now_millis;

use super::record;
use super::synchronizer::{CatalogSynchronizer, Half};
use crate::utils::{CatalogError, CatalogResult};

#[derive(Debug, Clone)]
pub struct CatalogService {
    sync: Arc<CatalogSynchronizer>,
}

impl CatalogService {
    pub fn new(sync: Arc<CatalogSynchronizer>) -> Self {
        Self { sync }
    }

    /// Next free `PROD###` over both halves of the current view
    pub fn generate_product_code(&self) -> CatalogResult<String> {
        let view = self.sync.loaded_view()?;
        Ok(record::next_product_code(view.all_products()))
    }

    /// Validate and store a new product
    ///
    /// A missing code is generated; a supplied one must be unique across
    /// the caller's records and the master catalog. Fails with
    /// `CatalogNotReady` until both halves have loaded.
    pub async fn create_product(&self, draft: ProductCreate) -> CatalogResult<Product> {
        let session = self.sync.session();
        let mut product = record::validate_create(draft, session, now_millis())?;

        let view = self.sync.loaded_view()?;
        if product.product_code.is_empty() {
            product.product_code = record::next_product_code(view.all_products());
        } else {
            record::ensure_code_unique(&product.product_code, view.all_products(), None)?;
        }

        let half = if product.is_master { Half::Master } else { Half::Own };
        let collection = self.sync.collection(half);
        let fields = record::to_fields(&product)?;
        product.id = self.sync.store().create(&collection, fields).await?;

        tracing::info!(
            product_id = %product.id,
            product_code = %product.product_code,
            is_master = product.is_master,
            "📦 Product created: {}",
            product.name
        );
        Ok(product)
    }

    /// Apply a partial update to a writable record
    pub async fn update_product(&self, product_id: &str, patch: ProductUpdate) -> CatalogResult<Product> {
        let (existing, path) = self.sync.writable(product_id)?;
        let updated = record::apply_update(&existing, patch, now_millis())?;

        if updated.product_code != existing.product_code {
            let view = self.sync.view();
            record::ensure_code_unique(&updated.product_code, view.all_products(), Some(product_id))?;
        }

        self.sync.store().set(&path, record::to_fields(&updated)?).await?;
        tracing::info!(product_id, "Product updated");
        Ok(updated)
    }

    /// Delete a record the caller owns (admins may delete master records)
    pub async fn delete_product(&self, product_id: &str) -> CatalogResult<()> {
        let (product, path) = self.sync.writable(product_id)?;
        self.sync.store().delete(&path).await?;
        tracing::info!(product_id, is_master = product.is_master, "Product deleted");
        Ok(())
    }

    /// Flip the onboarding suggestion flag of a master record
    pub async fn toggle_popular(&self, product_id: &str) -> CatalogResult<bool> {
        if !self.sync.session().is_admin {
            return Err(CatalogError::permission(
                ErrorCode::AdminRequired,
                "only administrators can mark popular products",
            ));
        }
        let view = self.sync.view();
        let product = match view.locate(product_id) {
            Some((product, Half::Master)) => product,
            Some((_, Half::Own)) => {
                return Err(CatalogError::validation(
                    ErrorCode::InvalidRequest,
                    "only master products can be popular",
                ));
            }
            None => return Err(CatalogError::product_not_found(product_id)),
        };

        let popular = !product.is_popular;
        let path = self.sync.document(Half::Master, product_id);
        self.sync
            .store()
            .update(&path, record::flag_fields("isPopular", popular, now_millis()))
            .await?;
        tracing::info!(product_id, popular, "Popular flag toggled");
        Ok(popular)
    }
}
