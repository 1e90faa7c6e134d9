//! Shop onboarding - popular master suggestions and adoption
//!
//! Suggestions are grouped by category; beer is further split by
//! container. Adopting copies master products into the shop namespace as
//! independent shop-owned records.

use std::sync::Arc;

use shared::models::{Container, Product, ProductCategory};
use shared::util::now_millis;

use super::record;
use super::synchronizer::{CatalogSynchronizer, CatalogView, Half};
use crate::utils::{CatalogError, CatalogResult};

/// Popular products of one container (beer only)
#[derive(Debug, Clone)]
pub struct ContainerGroup {
    /// `None` for beer without a container
    pub container: Option<Container>,
    pub products: Vec<Product>,
}

/// Popular products of one category
#[derive(Debug, Clone)]
pub struct OnboardingGroup {
    pub category: ProductCategory,
    pub products: Vec<Product>,
    /// Empty unless the category is sub-classified by container
    pub containers: Vec<ContainerGroup>,
}

/// Active popular master products grouped for onboarding
///
/// Categories follow menu order; empty categories are omitted.
pub fn popular_suggestions(view: &CatalogView) -> Vec<OnboardingGroup> {
    ProductCategory::ALL
        .into_iter()
        .filter_map(|category| {
            let products: Vec<Product> = view
                .master_products
                .iter()
                .filter(|p| p.category == category && p.is_popular && p.is_active)
                .cloned()
                .collect();
            if products.is_empty() {
                return None;
            }
            let containers = if category.supports_container() {
                group_by_container(&products)
            } else {
                Vec::new()
            };
            Some(OnboardingGroup {
                category,
                products,
                containers,
            })
        })
        .collect()
}

fn group_by_container(products: &[Product]) -> Vec<ContainerGroup> {
    Container::ALL
        .into_iter()
        .map(Some)
        .chain(std::iter::once(None))
        .filter_map(|container| {
            let matching: Vec<Product> = products
                .iter()
                .filter(|p| p.container == container)
                .cloned()
                .collect();
            (!matching.is_empty()).then_some(ContainerGroup {
                container,
                products: matching,
            })
        })
        .collect()
}

/// Copies master products into the caller's namespace
#[derive(Debug, Clone)]
pub struct Onboarding {
    sync: Arc<CatalogSynchronizer>,
}

impl Onboarding {
    pub fn new(sync: Arc<CatalogSynchronizer>) -> Self {
        Self { sync }
    }

    pub fn suggestions(&self) -> Vec<OnboardingGroup> {
        popular_suggestions(&self.sync.view())
    }

    /// Adopt the given master products as shop-owned records
    ///
    /// Copies get fresh ids and codes, zero stock and no reorder threshold.
    /// Every id is checked before anything is written.
    pub async fn adopt_master_products(&self, product_ids: &[String]) -> CatalogResult<Vec<Product>> {
        let view = self.sync.view();
        let sources = product_ids
            .iter()
            .map(|id| {
                view.master_products
                    .iter()
                    .find(|p| &p.id == id)
                    .ok_or_else(|| CatalogError::product_not_found(id))
            })
            .collect::<CatalogResult<Vec<_>>>()?;

        let session = self.sync.session();
        let collection = self.sync.collection(Half::Own);
        let mut taken: Vec<Product> = view.all_products().cloned().collect();
        let mut adopted = Vec::with_capacity(sources.len());

        for source in sources {
            let now = now_millis();
            let mut copy = source.clone();
            copy.id = String::new();
            copy.product_code = record::next_product_code(&taken);
            copy.stock = 0;
            copy.min_stock = 0;
            copy.is_master = false;
            copy.is_popular = false;
            copy.is_nomihodai = false;
            copy.profit = Product::profit_of(copy.cost, copy.price);
            copy.profit_rate = Product::profit_rate_of(copy.cost, copy.price);
            copy.added_by = session.email.clone();
            copy.created_at = now;
            copy.updated_at = now;

            copy.id = self
                .sync
                .store()
                .create(&collection, record::to_fields(&copy)?)
                .await?;
            tracing::debug!(source_id = %source.id, product_id = %copy.id, "Master product adopted");
            taken.push(copy.clone());
            adopted.push(copy);
        }

        tracing::info!(count = adopted.len(), user = %session.id, "Onboarding products adopted");
        Ok(adopted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn master(id: &str, category: &str, container: Option<&str>, popular: bool) -> Product {
        let mut p: Product = serde_json::from_value(json!({
            "name": id,
            "category": category,
            "container": container,
            "isMaster": true,
            "isPopular": popular,
        }))
        .unwrap();
        p.id = id.into();
        p
    }

    #[test]
    fn test_suggestions_grouped_by_category_and_container() {
        let view = CatalogView {
            master_products: vec![
                master("can-1", "beer", Some("can"), true),
                master("keg-1", "beer", Some("draft_keg"), true),
                master("bottle-1", "beer", Some("bottle"), false),
                master("wine-1", "wine", None, true),
            ],
            ..Default::default()
        };
        let groups = popular_suggestions(&view);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, ProductCategory::Beer);
        assert_eq!(groups[0].products.len(), 2);
        let containers: Vec<_> = groups[0].containers.iter().map(|g| g.container).collect();
        assert_eq!(containers, [Some(Container::DraftKeg), Some(Container::Can)]);
        assert_eq!(groups[1].category, ProductCategory::Wine);
        assert!(groups[1].containers.is_empty());
    }
}
