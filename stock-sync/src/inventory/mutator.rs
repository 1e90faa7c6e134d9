//! Stock Mutator - bounded stock writes and activation toggles
//!
//! Stock is read from the latest snapshot and written back as an absolute
//! value. Two devices adjusting the same record concurrently both compute
//! from the snapshot they saw; the later write wins.
// TODO: switch adjust_stock to a store-side increment once DocumentStore grows one

use std::sync::Arc;

use shared::util::now_millis;

use crate::catalog::record;
use crate::catalog::CatalogSynchronizer;
use crate::utils::CatalogResult;

/// Clamp a computed stock level into `0..=u32::MAX`
pub fn clamp_stock(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Amount added by a one-tap restock
pub fn restock_amount(min_stock: u32, default_amount: u32) -> u32 {
    if min_stock == 0 {
        default_amount
    } else {
        min_stock.saturating_mul(2)
    }
}

#[derive(Debug, Clone)]
pub struct StockMutator {
    sync: Arc<CatalogSynchronizer>,
}

impl StockMutator {
    pub fn new(sync: Arc<CatalogSynchronizer>) -> Self {
        Self { sync }
    }

    /// Write `max(0, stock + delta)`; returns the written value
    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> CatalogResult<u32> {
        let (product, path) = self.sync.writable(product_id)?;
        let stock = clamp_stock(i64::from(product.stock).saturating_add(delta));

        self.sync
            .store()
            .update(&path, record::stock_fields(stock, now_millis()))
            .await?;
        tracing::info!(product_id, delta, from = product.stock, to = stock, "Stock adjusted");
        Ok(stock)
    }

    /// Write an absolute stock level (negative input clamps to zero)
    pub async fn set_stock(&self, product_id: &str, stock: i64) -> CatalogResult<u32> {
        let (product, path) = self.sync.writable(product_id)?;
        let stock = clamp_stock(stock);

        self.sync
            .store()
            .update(&path, record::stock_fields(stock, now_millis()))
            .await?;
        tracing::info!(product_id, from = product.stock, to = stock, "Stock set");
        Ok(stock)
    }

    /// Add `minStock * 2`, or the configured default when there is no threshold
    pub async fn restock(&self, product_id: &str) -> CatalogResult<u32> {
        let (product, _) = self.sync.writable(product_id)?;
        let amount = restock_amount(product.min_stock, self.sync.config().default_restock_amount);
        self.adjust_stock(product_id, i64::from(amount)).await
    }

    /// Toggle `isActive`; stock is untouched
    pub async fn set_active(&self, product_id: &str, active: bool) -> CatalogResult<()> {
        let (_, path) = self.sync.writable(product_id)?;

        self.sync
            .store()
            .update(&path, record::flag_fields("isActive", active, now_millis()))
            .await?;
        tracing::info!(product_id, active, "Product activation changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_stock() {
        assert_eq!(clamp_stock(3 - 10), 0);
        assert_eq!(clamp_stock(19), 19);
        assert_eq!(clamp_stock(i64::MAX), u32::MAX);
    }

    #[test]
    fn test_restock_amount() {
        assert_eq!(restock_amount(0, 10), 10);
        assert_eq!(restock_amount(4, 10), 8);
    }
}
