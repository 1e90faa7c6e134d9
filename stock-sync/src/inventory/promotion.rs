//! Promotion Engine - move a shop record into the master catalog
//!
//! ```text
//! shops/{shop}/products/{id}  ──set──▶  shops/{admin}/products/{id}  (isMaster, stock 0)
//!            │
//!            └──────────delete (after the master copy is written)
//! ```
//!
//! The document id and product code travel with the record. Between the
//! two writes both halves may briefly show it; a repeated call finishes an
//! interrupted move.

use std::sync::Arc;

use shared::error::ErrorCode;
use shared::models::Product;
use shared::util::now_millis;

use crate::catalog::synchronizer::{CatalogSynchronizer, Half};
use crate::catalog::{query, record};
use crate::store::{paths, DocumentPath, StoreError};
use crate::utils::{CatalogError, CatalogResult};

#[derive(Debug, Clone, PartialEq)]
pub enum PromotionOutcome {
    Promoted(Product),
    /// Record was already in the master catalog; nothing changed
    AlreadyMaster(Product),
}

impl PromotionOutcome {
    pub fn product(&self) -> &Product {
        match self {
            Self::Promoted(p) | Self::AlreadyMaster(p) => p,
        }
    }
}

/// Master copy of `product`: stock and threshold reset, fresh timestamps
pub fn as_master(product: &Product, now: i64) -> Product {
    Product {
        is_master: true,
        is_popular: false,
        stock: 0,
        min_stock: 0,
        created_at: now,
        updated_at: now,
        ..product.clone()
    }
}

#[derive(Debug, Clone)]
pub struct PromotionEngine {
    sync: Arc<CatalogSynchronizer>,
}

impl PromotionEngine {
    pub fn new(sync: Arc<CatalogSynchronizer>) -> Self {
        Self { sync }
    }

    /// Master records whose name overlaps `name`; never blocks promotion
    pub fn similar_masters(&self, name: &str) -> Vec<Product> {
        let view = self.sync.view();
        query::similar_masters(&view, name).into_iter().cloned().collect()
    }

    async fn read(&self, path: &DocumentPath) -> CatalogResult<Option<Product>> {
        let store = self.sync.store().clone();
        let result = self
            .sync
            .retry_policy()
            .run("get", || {
                let store = store.clone();
                let path = path.clone();
                async move { store.get(&path).await }
            })
            .await;
        match result {
            Ok(doc) => Ok(Some(record::from_document(&doc)?)),
            Err(StoreError::Missing(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Promote a shop-owned record to the master catalog
    ///
    /// Administrator only. Promoting an already-master record succeeds
    /// without changes.
    pub async fn promote_to_master(&self, owner_namespace: &str, product_id: &str) -> CatalogResult<PromotionOutcome> {
        if !self.sync.session().is_admin {
            return Err(CatalogError::permission(
                ErrorCode::AdminRequired,
                "only administrators can promote products",
            ));
        }

        let master_path = self.sync.document(Half::Master, product_id);
        let existing_master = self.read(&master_path).await?;

        // record already lives in the admin namespace: flip in place
        if owner_namespace == self.sync.admin_namespace() {
            let product = existing_master.ok_or_else(|| CatalogError::product_not_found(product_id))?;
            if product.is_master {
                return Ok(PromotionOutcome::AlreadyMaster(product));
            }
            return self.write_master(&product, &master_path, None).await;
        }

        let shop_path = paths::products(owner_namespace).doc(product_id);
        let shop_record = self.read(&shop_path).await?;

        match (shop_record, existing_master) {
            (Some(_), Some(master)) if master.is_master => {
                // interrupted move: master copy exists, drop the shop copy
                self.sync.store().delete(&shop_path).await?;
                tracing::info!(product_id, owner = owner_namespace, "Completed interrupted promotion");
                Ok(PromotionOutcome::AlreadyMaster(master))
            }
            (Some(product), _) => self.write_master(&product, &master_path, Some(&shop_path)).await,
            (None, Some(master)) if master.is_master => Ok(PromotionOutcome::AlreadyMaster(master)),
            (None, _) => Err(CatalogError::product_not_found(product_id)),
        }
    }

    async fn write_master(
        &self,
        product: &Product,
        master_path: &DocumentPath,
        shop_path: Option<&DocumentPath>,
    ) -> CatalogResult<PromotionOutcome> {
        let promoted = as_master(product, now_millis());
        self.sync
            .store()
            .set(master_path, record::to_fields(&promoted)?)
            .await?;
        if let Some(shop_path) = shop_path {
            self.sync.store().delete(shop_path).await?;
        }

        tracing::info!(
            product_id = %promoted.id,
            product_code = %promoted.product_code,
            "⭐ Product promoted to master: {}",
            promoted.name
        );
        Ok(PromotionOutcome::Promoted(promoted))
    }
}
