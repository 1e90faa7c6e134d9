//! Reconciliation (stock-taking) Model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::ProductCategory;

/// Display classification of a counted item, `sign(difference)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    Match,
    /// Counted more than the system recorded
    Surplus,
    /// Counted less than the system recorded
    Shortage,
}

impl DiscrepancyKind {
    pub fn from_difference(difference: i64) -> Self {
        match difference.cmp(&0) {
            Ordering::Equal => Self::Match,
            Ordering::Greater => Self::Surplus,
            Ordering::Less => Self::Shortage,
        }
    }
}

/// One product line of a finalized stock-taking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationItem {
    pub product_id: String,
    #[serde(default)]
    pub product_code: String,
    pub name: String,
    pub category: ProductCategory,
    /// Stock recorded by the system when the session started
    pub system_stock: u32,
    /// Physical count (baseline when never counted)
    pub actual_stock: u32,
    /// `actual - system`
    pub difference: i64,
    /// Whether the operator entered a count
    pub counted: bool,
    pub kind: DiscrepancyKind,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub unit_cost: Decimal,
}

impl ReconciliationItem {
    pub fn is_discrepant(&self) -> bool {
        self.difference != 0
    }
}

/// Aggregate totals captured with a stock-taking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    /// Active products at capture time
    pub total_items: usize,
    /// System stock units at capture time
    pub total_stock: u64,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_potential_profit: Decimal,
    pub counted_items: usize,
    pub discrepant_items: usize,
    pub surplus_items: usize,
    pub shortage_items: usize,
    /// Sum of all differences
    pub net_difference: i64,
    /// Sum of `difference * unit_cost`
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discrepancy_value: Decimal,
}

/// Immutable record of one finalized stock-taking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationRecord {
    #[serde(default, skip_serializing)]
    pub id: String,
    /// Calendar date of the count
    pub date: NaiveDate,
    pub shop_id: String,
    /// Email of the operator
    pub taken_by: String,
    /// Unix millis
    pub started_at: i64,
    /// Unix millis
    pub finalized_at: i64,
    pub items: Vec<ReconciliationItem>,
    pub analysis: AnalysisSnapshot,
}

impl ReconciliationRecord {
    /// Items whose count differs from the baseline
    pub fn discrepancies(&self) -> impl Iterator<Item = &ReconciliationItem> {
        self.items.iter().filter(|item| item.is_discrepant())
    }

    pub fn has_discrepancies(&self) -> bool {
        self.analysis.discrepant_items > 0
    }
}
