//! Analytics Aggregator - inventory statistics over a catalog view
//!
//! Everything here is a pure function of a [`CatalogView`].

use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{Product, ProductCategory};

use crate::catalog::CatalogView;
use crate::core::Config;

/// Thresholds that drive recommendations and stock classification
#[derive(Debug, Clone)]
pub struct AnalyticsThresholds {
    pub high_value_threshold: Decimal,
    pub low_stock_warning_ratio: Decimal,
    pub overstock_multiplier: u32,
}

impl AnalyticsThresholds {
    pub fn from_config(config: &Config) -> Self {
        Self {
            high_value_threshold: config.high_value_threshold,
            low_stock_warning_ratio: config.low_stock_warning_ratio,
            overstock_multiplier: config.overstock_multiplier,
        }
    }
}

impl Default for AnalyticsThresholds {
    fn default() -> Self {
        Self {
            high_value_threshold: Decimal::from(1_000_000),
            low_stock_warning_ratio: Decimal::new(2, 1),
            overstock_multiplier: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: ProductCategory,
    pub item_count: usize,
    pub stock_units: u64,
    pub value: Decimal,
    pub potential_profit: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub level: RecommendationLevel,
    pub message: String,
}

/// Portfolio statistics of the active products in a view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub total_items: usize,
    pub total_stock: u64,
    pub total_value: Decimal,
    pub total_potential_profit: Decimal,
    /// `0 < stock <= minStock`
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    /// `stock > minStock * multiplier`, only where a threshold is set
    pub overstock_count: usize,
    /// Neither low, out, nor over-stocked
    pub healthy_count: usize,
    /// Sorted by value, highest first
    pub categories: Vec<CategorySummary>,
    pub recommendations: Vec<Recommendation>,
}

impl InventoryReport {
    pub fn largest_category(&self) -> Option<&CategorySummary> {
        self.categories.first()
    }

    /// Share of items at or below their reorder threshold
    pub fn low_stock_ratio(&self) -> Decimal {
        if self.total_items == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.low_stock_count) / Decimal::from(self.total_items)
    }
}

fn is_overstocked(product: &Product, multiplier: u32) -> bool {
    product.min_stock > 0 && u64::from(product.stock) > u64::from(product.min_stock) * u64::from(multiplier)
}

/// Aggregate the active products of `view`
pub fn analyze(view: &CatalogView, thresholds: &AnalyticsThresholds) -> InventoryReport {
    let mut report = InventoryReport::default();
    let mut categories: Vec<CategorySummary> = Vec::new();

    for product in view.all_products().filter(|p| p.is_active) {
        let value = product.inventory_value();
        let profit = product.potential_profit();

        report.total_items += 1;
        report.total_stock += u64::from(product.stock);
        report.total_value += value;
        report.total_potential_profit += profit;

        let overstocked = is_overstocked(product, thresholds.overstock_multiplier);
        if product.is_out_of_stock() {
            report.out_of_stock_count += 1;
        } else if product.is_low_stock() {
            report.low_stock_count += 1;
        } else if overstocked {
            report.overstock_count += 1;
        } else {
            report.healthy_count += 1;
        }

        let summary = match categories.iter().position(|c| c.category == product.category) {
            Some(idx) => &mut categories[idx],
            None => {
                categories.push(CategorySummary {
                    category: product.category,
                    item_count: 0,
                    stock_units: 0,
                    value: Decimal::ZERO,
                    potential_profit: Decimal::ZERO,
                });
                let last = categories.len() - 1;
                &mut categories[last]
            }
        };
        summary.item_count += 1;
        summary.stock_units += u64::from(product.stock);
        summary.value += value;
        summary.potential_profit += profit;
    }

    categories.sort_by(|a, b| b.value.cmp(&a.value).then(a.category.cmp(&b.category)));
    report.categories = categories;
    report.recommendations = recommendations(&report, thresholds);
    report
}

fn recommendations(report: &InventoryReport, thresholds: &AnalyticsThresholds) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if report.low_stock_ratio() > thresholds.low_stock_warning_ratio {
        out.push(Recommendation {
            level: RecommendationLevel::Warning,
            message: format!(
                "{} of {} products are running low; plan a restock",
                report.low_stock_count, report.total_items
            ),
        });
    }
    if report.out_of_stock_count > 0 {
        out.push(Recommendation {
            level: RecommendationLevel::Error,
            message: format!("{} products are out of stock", report.out_of_stock_count),
        });
    }
    if report.total_value > thresholds.high_value_threshold {
        out.push(Recommendation {
            level: RecommendationLevel::Info,
            message: format!(
                "Inventory value {} exceeds {}; review slow movers",
                report.total_value.round_dp(0),
                thresholds.high_value_threshold
            ),
        });
    }
    if out.is_empty() {
        out.push(Recommendation {
            level: RecommendationLevel::Success,
            message: "Inventory levels look healthy".into(),
        });
    }
    out
}

/// Per-category breakdown of the master catalog (administrator dashboard)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterCategoryStat {
    pub category: ProductCategory,
    pub master_count: usize,
    pub popular_count: usize,
    /// Rounded percent of all master records
    pub share_percent: u32,
}

pub fn master_catalog_stats(view: &CatalogView) -> Vec<MasterCategoryStat> {
    let total = view.master_products.len();
    ProductCategory::ALL
        .into_iter()
        .map(|category| {
            let in_category = view.master_products.iter().filter(|p| p.category == category);
            let master_count = in_category.clone().count();
            let popular_count = in_category.filter(|p| p.is_popular).count();
            let share_percent = if total == 0 {
                0
            } else {
                ((master_count * 200 + total) / (total * 2)) as u32
            };
            MasterCategoryStat {
                category,
                master_count,
                popular_count,
                share_percent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn product(category: &str, cost: i64, price: i64, stock: u32, min_stock: u32) -> Product {
        serde_json::from_value(json!({
            "name": "p",
            "category": category,
            "cost": cost,
            "price": price,
            "stock": stock,
            "minStock": min_stock,
        }))
        .unwrap()
    }

    fn view_of(products: Vec<Product>) -> CatalogView {
        CatalogView {
            own_products: products,
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_portfolio() {
        let view = view_of(vec![product("beer", 100, 200, 5, 2), product("beer", 50, 80, 0, 3)]);
        let report = analyze(&view, &AnalyticsThresholds::default());
        assert_eq!(report.total_value, dec!(500));
        assert_eq!(report.total_potential_profit, dec!(500));
        assert_eq!(report.low_stock_count, 0);
        assert_eq!(report.out_of_stock_count, 1);
        assert_eq!(report.total_items, 2);
        assert_eq!(report.total_stock, 5);
        let levels: Vec<_> = report.recommendations.iter().map(|r| r.level).collect();
        assert_eq!(levels, [RecommendationLevel::Error]);
    }

    #[test]
    fn test_inactive_products_are_ignored() {
        let mut inactive = product("wine", 1000, 2000, 10, 0);
        inactive.is_active = false;
        let report = analyze(&view_of(vec![inactive]), &AnalyticsThresholds::default());
        assert_eq!(report.total_items, 0);
        assert_eq!(report.total_value, Decimal::ZERO);
        assert_eq!(report.recommendations[0].level, RecommendationLevel::Success);
    }

    #[test]
    fn test_categories_sorted_by_value_and_classification() {
        let view = view_of(vec![
            product("sake", 10, 20, 2, 5),
            product("wine", 1000, 2000, 10, 3),
            product("sake", 10, 20, 20, 5),
            product("beer", 100, 150, 4, 0),
        ]);
        let report = analyze(&view, &AnalyticsThresholds::default());
        let order: Vec<_> = report.categories.iter().map(|c| c.category).collect();
        assert_eq!(order, [ProductCategory::Wine, ProductCategory::Beer, ProductCategory::Sake]);
        assert_eq!(report.largest_category().map(|c| c.value), Some(dec!(10000)));

        assert_eq!(report.low_stock_count, 1);
        assert_eq!(report.overstock_count, 2);
        assert_eq!(report.healthy_count, 1);
        // 1 of 4 low is above 20%
        let levels: Vec<_> = report.recommendations.iter().map(|r| r.level).collect();
        assert_eq!(levels, [RecommendationLevel::Warning]);
    }

    #[test]
    fn test_high_value_info() {
        let view = view_of(vec![product("whisky", 100_000, 150_000, 11, 0)]);
        let report = analyze(&view, &AnalyticsThresholds::default());
        assert_eq!(report.recommendations[0].level, RecommendationLevel::Info);
    }

    #[test]
    fn test_master_catalog_stats() {
        let mut a = product("beer", 1, 2, 0, 0);
        a.is_popular = true;
        let view = CatalogView {
            master_products: vec![a, product("beer", 1, 2, 0, 0), product("wine", 1, 2, 0, 0)],
            ..Default::default()
        };
        let stats = master_catalog_stats(&view);
        assert_eq!(stats.len(), 10);
        assert_eq!(stats[0].master_count, 2);
        assert_eq!(stats[0].popular_count, 1);
        assert_eq!(stats[0].share_percent, 67);
        let wine = stats.iter().find(|s| s.category == ProductCategory::Wine).unwrap();
        assert_eq!(wine.share_percent, 33);
    }
}
