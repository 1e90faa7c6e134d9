//! Unified error codes for the stock catalog
//!
//! - [`ErrorCode`]: Standardized numeric codes for every domain failure
//! - [`ErrorCategory`]: Classification of codes by domain
//!
//! The logic crate owns the error *type*; this module only carries the
//! stable codes a presentation layer translates into user-facing text.
//!
//! # Example
//!
//! ```
//! use shared::error::{ErrorCategory, ErrorCode};
//!
//! let code = ErrorCode::ProductCodeExists;
//! assert_eq!(code.code(), 6004);
//! assert_eq!(code.category(), ErrorCategory::Product);
//! ```

mod category;
mod codes;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
