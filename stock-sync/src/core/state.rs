//! Session state - composition root for one logged-in session
//!
//! Owns the synchronizer (and with it both subscriptions) and hands the
//! same handle to every component. Dropping or shutting down the state
//! ends the subscriptions.

use std::sync::Arc;

use shared::models::Session;

use super::Config;
use crate::analytics::{self, AnalyticsThresholds, InventoryReport, MasterCategoryStat};
use crate::catalog::{CatalogService, CatalogSynchronizer, CatalogView, Onboarding};
use crate::inventory::{PromotionEngine, StockMutator};
use crate::reconciliation::ReconciliationEngine;
use crate::store::DocumentStore;

#[derive(Debug, Clone)]
pub struct SessionState {
    pub config: Config,
    /// Live merged catalog
    pub sync: Arc<CatalogSynchronizer>,
    pub catalog: CatalogService,
    pub stock: StockMutator,
    pub promotion: PromotionEngine,
    pub onboarding: Onboarding,
    pub reconciliation: Arc<ReconciliationEngine>,
}

impl SessionState {
    /// Subscribe to the catalog for `session` and wire up all components
    pub async fn initialize(store: Arc<dyn DocumentStore>, session: Session, config: Config) -> Self {
        let sync = Arc::new(CatalogSynchronizer::start(store, session, config.clone()).await);
        Self {
            catalog: CatalogService::new(sync.clone()),
            stock: StockMutator::new(sync.clone()),
            promotion: PromotionEngine::new(sync.clone()),
            onboarding: Onboarding::new(sync.clone()),
            reconciliation: Arc::new(ReconciliationEngine::new(sync.clone())),
            sync,
            config,
        }
    }

    pub fn view(&self) -> CatalogView {
        self.sync.view()
    }

    /// Inventory statistics of the current view
    pub fn report(&self) -> InventoryReport {
        analytics::analyze(&self.sync.view(), &AnalyticsThresholds::from_config(&self.config))
    }

    pub fn master_stats(&self) -> Vec<MasterCategoryStat> {
        analytics::master_catalog_stats(&self.sync.view())
    }

    /// End both subscriptions and wait for the listeners
    pub async fn shutdown(&self) {
        self.sync.join().await;
    }
}
