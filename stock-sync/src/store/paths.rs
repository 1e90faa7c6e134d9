//! Collection layout
//!
//! ```text
//! shops/{namespace}/products          product records
//! shops/{namespace}/reconciliations   stock-taking history
//! ```
//!
//! Shop users own the namespace named after their session id. Master
//! records live in the administrator namespace.

use super::CollectionPath;

pub fn products(namespace: &str) -> CollectionPath {
    CollectionPath::new(format!("shops/{namespace}/products"))
}

pub fn reconciliations(namespace: &str) -> CollectionPath {
    CollectionPath::new(format!("shops/{namespace}/reconciliations"))
}
