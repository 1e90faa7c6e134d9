//! Reconciliation Engine - stock-taking state machine
//!
//! ```text
//! NotStarted ──start──▶ InProgress ──finalize──▶ Finalizing ──persisted──▶ Finalized
//!      ▲                    │    ▲                      │                        │
//!      └──────cancel────────┘    └────append failed─────┘                        │
//!                           ▲────────────────────start───────────────────────────┘
//! ```
//!
//! While `Finalizing` the counts are frozen: every call except `status`
//! fails with `StockTakingFinalizing`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{AnalysisSnapshot, DiscrepancyKind, Product, ReconciliationItem, ReconciliationRecord};
use shared::util::{now_millis, today};

use super::history::ReconciliationHistory;
use crate::catalog::CatalogSynchronizer;
use crate::inventory::StockMutator;
use crate::utils::{CatalogError, CatalogResult};

/// Counted vs. total baseline items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub counted: usize,
    pub total: usize,
}

impl Progress {
    /// Whole percent counted; 100 for an empty baseline
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        (self.counted * 100 / self.total) as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationStatus {
    NotStarted,
    InProgress(Progress),
    Finalizing,
    Finalized,
}

#[derive(Debug, Clone)]
struct BaselineEntry {
    product: Product,
    actual: Option<u32>,
}

impl BaselineEntry {
    fn item(&self) -> ReconciliationItem {
        let system_stock = self.product.stock;
        let actual_stock = self.actual.unwrap_or(system_stock);
        let difference = i64::from(actual_stock) - i64::from(system_stock);
        ReconciliationItem {
            product_id: self.product.id.clone(),
            product_code: self.product.product_code.clone(),
            name: self.product.name.clone(),
            category: self.product.category,
            system_stock,
            actual_stock,
            difference,
            counted: self.actual.is_some(),
            kind: DiscrepancyKind::from_difference(difference),
            unit_cost: self.product.cost,
        }
    }
}

/// One in-progress stock-taking
#[derive(Debug, Clone)]
pub struct StockTaking {
    date: NaiveDate,
    started_at: i64,
    entries: Vec<BaselineEntry>,
    /// product id → entries index
    index: HashMap<String, usize>,
}

impl StockTaking {
    /// Capture system stock of every active product (first occurrence of an id wins)
    pub fn capture<'a>(products: impl IntoIterator<Item = &'a Product>, date: NaiveDate, started_at: i64) -> Self {
        let mut entries = Vec::new();
        let mut index = HashMap::new();
        for product in products.into_iter().filter(|p| p.is_active) {
            if index.contains_key(&product.id) {
                continue;
            }
            index.insert(product.id.clone(), entries.len());
            entries.push(BaselineEntry {
                product: product.clone(),
                actual: None,
            });
        }
        Self {
            date,
            started_at,
            entries,
            index,
        }
    }

    /// Store or overwrite a physical count
    pub fn record_count(&mut self, product_id: &str, actual_stock: u32) -> CatalogResult<ReconciliationItem> {
        let idx = *self.index.get(product_id).ok_or_else(|| {
            CatalogError::not_found(
                ErrorCode::StockTakingItemNotFound,
                format!("product {product_id} is not part of this stock-taking"),
            )
        })?;
        let entry = &mut self.entries[idx];
        entry.actual = Some(actual_stock);
        Ok(entry.item())
    }

    pub fn items(&self) -> Vec<ReconciliationItem> {
        self.entries.iter().map(BaselineEntry::item).collect()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            counted: self.entries.iter().filter(|e| e.actual.is_some()).count(),
            total: self.entries.len(),
        }
    }

    fn analysis(&self, items: &[ReconciliationItem]) -> AnalysisSnapshot {
        let mut analysis = AnalysisSnapshot {
            total_items: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            analysis.total_stock += u64::from(entry.product.stock);
            analysis.total_value += entry.product.inventory_value();
            analysis.total_potential_profit += entry.product.potential_profit();
        }
        for item in items {
            if item.counted {
                analysis.counted_items += 1;
            }
            match item.kind {
                DiscrepancyKind::Match => {}
                DiscrepancyKind::Surplus => analysis.surplus_items += 1,
                DiscrepancyKind::Shortage => analysis.shortage_items += 1,
            }
            analysis.net_difference += item.difference;
            analysis.discrepancy_value += Decimal::from(item.difference) * item.unit_cost;
        }
        analysis.discrepant_items = analysis.surplus_items + analysis.shortage_items;
        analysis
    }

    /// Close the count; uncounted items keep their baseline
    pub fn finish(&self, shop_id: &str, taken_by: &str, finalized_at: i64) -> ReconciliationRecord {
        let items = self.items();
        let analysis = self.analysis(&items);
        ReconciliationRecord {
            id: String::new(),
            date: self.date,
            shop_id: shop_id.to_string(),
            taken_by: taken_by.to_string(),
            started_at: self.started_at,
            finalized_at,
            items,
            analysis,
        }
    }
}

#[derive(Debug)]
enum EngineState {
    NotStarted,
    InProgress(StockTaking),
    Finalizing,
    Finalized(ReconciliationRecord),
}

/// Puts the stock-taking back in progress unless disarmed
struct FinalizeGuard<'a> {
    state: &'a Mutex<EngineState>,
    taking: Option<StockTaking>,
}

impl FinalizeGuard<'_> {
    fn disarm(&mut self) {
        self.taking = None;
    }
}

impl Drop for FinalizeGuard<'_> {
    fn drop(&mut self) {
        if let Some(taking) = self.taking.take() {
            *self.state.lock() = EngineState::InProgress(taking);
        }
    }
}

/// Runs stock-takings for the synchronizer's session
#[derive(Debug)]
pub struct ReconciliationEngine {
    sync: Arc<CatalogSynchronizer>,
    history: ReconciliationHistory,
    mutator: StockMutator,
    state: Mutex<EngineState>,
}

impl ReconciliationEngine {
    pub fn new(sync: Arc<CatalogSynchronizer>) -> Self {
        let history = ReconciliationHistory::new(
            sync.store().clone(),
            sync.own_namespace(),
            sync.config().reconciliation_history_limit,
            sync.retry_policy(),
        );
        Self {
            mutator: StockMutator::new(sync.clone()),
            history,
            sync,
            state: Mutex::new(EngineState::NotStarted),
        }
    }

    pub fn history(&self) -> &ReconciliationHistory {
        &self.history
    }

    pub fn status(&self) -> ReconciliationStatus {
        match &*self.state.lock() {
            EngineState::NotStarted => ReconciliationStatus::NotStarted,
            EngineState::InProgress(taking) => ReconciliationStatus::InProgress(taking.progress()),
            EngineState::Finalizing => ReconciliationStatus::Finalizing,
            EngineState::Finalized(_) => ReconciliationStatus::Finalized,
        }
    }

    /// Snapshot system stock for every active product in the view
    pub fn start_session(&self) -> CatalogResult<Progress> {
        let mut state = self.state.lock();
        match *state {
            EngineState::InProgress(_) => {
                return Err(CatalogError::invalid_state(
                    ErrorCode::StockTakingInProgress,
                    "a stock-taking is already in progress",
                ));
            }
            EngineState::Finalizing => return Err(finalizing()),
            EngineState::NotStarted | EngineState::Finalized(_) => {}
        }
        let view = self.sync.view();
        let taking = StockTaking::capture(view.all_products(), today(), now_millis());
        let progress = taking.progress();
        *state = EngineState::InProgress(taking);

        tracing::info!(items = progress.total, user = %self.sync.session().id, "Stock-taking started");
        Ok(progress)
    }

    /// Store a physical count; the latest entry for a product wins
    pub fn record_count(&self, product_id: &str, actual_stock: i64) -> CatalogResult<ReconciliationItem> {
        let actual_stock = u32::try_from(actual_stock).map_err(|_| {
            CatalogError::validation(ErrorCode::ValueOutOfRange, "count must be between 0 and 4294967295")
        })?;
        match &mut *self.state.lock() {
            EngineState::InProgress(taking) => {
                let item = taking.record_count(product_id, actual_stock)?;
                tracing::debug!(product_id, actual_stock, difference = item.difference, "Count recorded");
                Ok(item)
            }
            EngineState::Finalizing => Err(finalizing()),
            _ => Err(not_in_progress()),
        }
    }

    /// Current items with live differences
    pub fn items(&self) -> CatalogResult<Vec<ReconciliationItem>> {
        match &*self.state.lock() {
            EngineState::InProgress(taking) => Ok(taking.items()),
            EngineState::Finalizing => Err(finalizing()),
            _ => Err(not_in_progress()),
        }
    }

    pub fn progress(&self) -> Option<Progress> {
        match &*self.state.lock() {
            EngineState::InProgress(taking) => Some(taking.progress()),
            _ => None,
        }
    }

    /// Abandon the running stock-taking
    pub fn cancel(&self) -> CatalogResult<()> {
        let mut state = self.state.lock();
        match *state {
            EngineState::InProgress(_) => {}
            EngineState::Finalizing => return Err(finalizing()),
            _ => return Err(not_in_progress()),
        }
        *state = EngineState::NotStarted;
        tracing::info!("Stock-taking cancelled");
        Ok(())
    }

    /// Close the session and persist the record
    ///
    /// The counts are frozen before the record is written, so concurrent
    /// calls see `Finalizing`. When persisting fails (or the future is
    /// dropped) the session goes back to in progress.
    pub async fn finalize(&self) -> CatalogResult<ReconciliationRecord> {
        let taking = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, EngineState::Finalizing) {
                EngineState::InProgress(taking) => taking,
                other => {
                    let err = if matches!(other, EngineState::Finalizing) {
                        finalizing()
                    } else {
                        not_in_progress()
                    };
                    *state = other;
                    return Err(err);
                }
            }
        };

        let session = self.sync.session();
        let mut record = taking.finish(self.sync.own_namespace(), &session.email, now_millis());
        let mut guard = FinalizeGuard {
            state: &self.state,
            taking: Some(taking),
        };

        record.id = self.history.append(&record).await?;
        guard.disarm();
        *self.state.lock() = EngineState::Finalized(record.clone());

        tracing::info!(
            record_id = %record.id,
            counted = record.analysis.counted_items,
            discrepancies = record.analysis.discrepant_items,
            net_difference = record.analysis.net_difference,
            "Stock-taking finalized"
        );
        Ok(record)
    }

    /// Most recently finalized record of this engine
    pub fn last_record(&self) -> Option<ReconciliationRecord> {
        match &*self.state.lock() {
            EngineState::Finalized(record) => Some(record.clone()),
            _ => None,
        }
    }

    /// Write each discrepant count back as the new stock level
    ///
    /// Master records the caller cannot write are skipped. Every other
    /// target is resolved before the first write, so a missing product
    /// fails the call without touching any stock. Returns how many
    /// products were updated.
    pub async fn apply_counts(&self, record: &ReconciliationRecord) -> CatalogResult<usize> {
        let mut targets = Vec::new();
        let mut skipped = 0usize;
        for item in record.discrepancies() {
            match self.sync.writable(&item.product_id) {
                Ok(_) => targets.push(item),
                Err(CatalogError::Permission { .. }) => skipped += 1,
                Err(e) => return Err(e),
            }
        }

        let mut applied = 0;
        for item in targets {
            self.mutator
                .set_stock(&item.product_id, i64::from(item.actual_stock))
                .await?;
            applied += 1;
        }
        tracing::info!(record_id = %record.id, applied, skipped, "Stock-taking counts applied");
        Ok(applied)
    }
}

fn not_in_progress() -> CatalogError {
    CatalogError::invalid_state(ErrorCode::StockTakingNotStarted, "no stock-taking in progress")
}

fn finalizing() -> CatalogError {
    CatalogError::invalid_state(ErrorCode::StockTakingFinalizing, "stock-taking is being finalized")
}
