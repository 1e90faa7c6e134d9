//! Shared types for the stock catalog
//!
//! Document models, error codes and small utilities used by the logic
//! crate and by any presentation layer built on top of it.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ErrorCategory, ErrorCode};
pub use models::{Product, ProductCategory, ReconciliationRecord, Session};
pub use serde::{Deserialize, Serialize};
