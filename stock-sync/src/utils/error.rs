//! 统一错误处理
//!
//! [`CatalogError`] is the single error type returned by every catalog,
//! stock and stock-taking operation.
//!
//! | Variant | ErrorCode range | Retried |
//! |---------|-----------------|---------|
//! | `Validation` | 0xxx / 6xxx | no |
//! | `DuplicateCode` | 6004 | no |
//! | `NotFound` | 0003 / 6001 / 7003 | no |
//! | `Permission` | 2xxx / 6006 | no |
//! | `InvalidState` | 7xxx | no |
//! | `Transport` | 9xxx | idempotent reads only |

use shared::error::ErrorCode;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Payload missing a field or carrying a malformed value
    #[error("Validation error: {message}")]
    Validation { code: ErrorCode, message: String },

    /// `productCode` already used in the combined catalog
    #[error("Product code already exists: {0}")]
    DuplicateCode(String),

    #[error("Not found: {message}")]
    NotFound { code: ErrorCode, message: String },

    #[error("Permission denied: {message}")]
    Permission { code: ErrorCode, message: String },

    /// Stock-taking state machine misuse
    #[error("Invalid state: {message}")]
    InvalidState { code: ErrorCode, message: String },

    #[error("Transport error: {0}")]
    Transport(StoreError),
}

impl CatalogError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn product_not_found(product_id: &str) -> Self {
        Self::not_found(ErrorCode::ProductNotFound, format!("product {product_id}"))
    }

    pub fn permission(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Permission {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_state(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::InvalidState {
            code,
            message: message.into(),
        }
    }

    /// Stable numeric code for presentation layers
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. }
            | Self::NotFound { code, .. }
            | Self::Permission { code, .. }
            | Self::InvalidState { code, .. } => *code,
            Self::DuplicateCode(_) => ErrorCode::ProductCodeExists,
            Self::Transport(e) => e.code(),
        }
    }

    /// Only transport failures may succeed when repeated
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing(path) => Self::not_found(ErrorCode::NotFound, path),
            other => Self::Transport(other),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation(ErrorCode::ValidationFailed, err.to_string())
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
