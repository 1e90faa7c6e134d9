//! Data models
//!
//! Document shapes shared by the logic layer and any presentation layer.
//! Field names are camelCase to match the stored documents.

pub mod product;
pub mod reconciliation;
pub mod serde_helpers;
pub mod session;

// Re-exports
pub use product::*;
pub use reconciliation::*;
pub use session::*;
