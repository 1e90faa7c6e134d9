//! Catalog queries over a [`CatalogView`]

use shared::models::{Product, ProductCategory};

use super::synchronizer::CatalogView;

/// Minimum input length before name suggestions are offered
pub const SUGGESTION_MIN_CHARS: usize = 2;
/// Maximum number of name suggestions
pub const SUGGESTION_LIMIT: usize = 5;

/// Case-insensitive substring search over name and manufacturer
///
/// An empty `text` matches everything; `category` narrows the result.
pub fn search<'a>(
    view: &'a CatalogView,
    text: &str,
    category: Option<ProductCategory>,
) -> Vec<&'a Product> {
    let needle = text.trim().to_lowercase();
    view.all_products()
        .filter(|p| category.is_none_or(|c| p.category == c))
        .filter(|p| needle.is_empty() || p.matches_text(&needle))
        .collect()
}

/// Name suggestions for the add-product form
pub fn suggestions<'a>(view: &'a CatalogView, input: &str) -> Vec<&'a Product> {
    let needle = input.trim().to_lowercase();
    if needle.chars().count() < SUGGESTION_MIN_CHARS {
        return Vec::new();
    }
    view.all_products()
        .filter(|p| p.matches_text(&needle))
        .take(SUGGESTION_LIMIT)
        .collect()
}

/// Master records whose name overlaps `name` (either contains the other)
///
/// Advisory only; nothing blocks on the result.
pub fn similar_masters<'a>(view: &'a CatalogView, name: &str) -> Vec<&'a Product> {
    let candidate = name.trim().to_lowercase();
    if candidate.is_empty() {
        return Vec::new();
    }
    view.master_products
        .iter()
        .filter(|p| {
            let existing = p.name.to_lowercase();
            existing.contains(&candidate) || candidate.contains(&existing)
        })
        .collect()
}

/// Record with the same name and manufacturer (case-insensitive)
pub fn exact_duplicate<'a>(
    view: &'a CatalogView,
    name: &str,
    manufacturer: Option<&str>,
) -> Option<&'a Product> {
    let name = name.trim().to_lowercase();
    let manufacturer = manufacturer.map(|m| m.trim().to_lowercase()).unwrap_or_default();
    view.all_products().find(|p| {
        p.name.trim().to_lowercase() == name
            && p.manufacturer.as_deref().map(|m| m.trim().to_lowercase()).unwrap_or_default()
                == manufacturer
    })
}

/// Records the caller added to its own namespace
pub fn own_product_count(view: &CatalogView) -> usize {
    view.own_products.len()
}
