//! Unified error codes for the stock catalog
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 2xxx: Permission errors
//! - 6xxx: Product errors
//! - 7xxx: Stock-taking errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so a presentation layer
/// can map them to localized messages without parsing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 2xxx: Permission ====================
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product has invalid price or cost
    ProductInvalidPrice = 6002,
    /// Product code already exists in the combined catalog
    ProductCodeExists = 6004,
    /// Product name is required
    ProductNameRequired = 6005,
    /// Master products are read-only for shops
    MasterProductReadOnly = 6006,
    /// Category is not one of the fixed beverage categories
    CategoryInvalid = 6101,

    // ==================== 7xxx: Stock-taking ====================
    /// No stock-taking session in progress
    StockTakingNotStarted = 7001,
    /// A stock-taking session is already in progress
    StockTakingInProgress = 7002,
    /// Product is not part of the session baseline
    StockTakingItemNotFound = 7003,
    /// Stock-taking is being persisted and cannot change
    StockTakingFinalizing = 7004,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Document store unreachable
    StoreUnavailable = 9002,
    /// Document store rejected the write
    StoreRejected = 9003,
    /// Live subscription failed
    SubscriptionFailed = 9004,
    /// Catalog has not received its first snapshot yet
    CatalogNotReady = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Permission
            ErrorCode::AdminRequired => "Administrator role required",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product cost or price is invalid",
            ErrorCode::ProductCodeExists => "Product code already exists",
            ErrorCode::ProductNameRequired => "Product name is required",
            ErrorCode::MasterProductReadOnly => "Master products cannot be changed by a shop",
            ErrorCode::CategoryInvalid => "Unknown product category",

            // Stock-taking
            ErrorCode::StockTakingNotStarted => "No stock-taking session in progress",
            ErrorCode::StockTakingInProgress => "A stock-taking session is already in progress",
            ErrorCode::StockTakingItemNotFound => "Product is not part of this stock-taking",
            ErrorCode::StockTakingFinalizing => "Stock-taking is being finalized",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::StoreUnavailable => "Document store unavailable",
            ErrorCode::StoreRejected => "Document store rejected the write",
            ErrorCode::SubscriptionFailed => "Live subscription failed",
            ErrorCode::CatalogNotReady => "Catalog is still loading",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Permission
            2003 => Ok(ErrorCode::AdminRequired),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6004 => Ok(ErrorCode::ProductCodeExists),
            6005 => Ok(ErrorCode::ProductNameRequired),
            6006 => Ok(ErrorCode::MasterProductReadOnly),
            6101 => Ok(ErrorCode::CategoryInvalid),

            // Stock-taking
            7001 => Ok(ErrorCode::StockTakingNotStarted),
            7002 => Ok(ErrorCode::StockTakingInProgress),
            7003 => Ok(ErrorCode::StockTakingItemNotFound),
            7004 => Ok(ErrorCode::StockTakingFinalizing),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StoreUnavailable),
            9003 => Ok(ErrorCode::StoreRejected),
            9004 => Ok(ErrorCode::SubscriptionFailed),
            9005 => Ok(ErrorCode::CatalogNotReady),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::AdminRequired.code(), 2003);
        assert_eq!(ErrorCode::ProductNotFound.code(), 6001);
        assert_eq!(ErrorCode::ProductCodeExists.code(), 6004);
        assert_eq!(ErrorCode::StockTakingNotStarted.code(), 7001);
        assert_eq!(ErrorCode::StoreUnavailable.code(), 9002);
    }

    #[test]
    fn test_try_from_round_trips_every_code() {
        let all = [
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::InvalidRequest,
            ErrorCode::ValueOutOfRange,
            ErrorCode::AdminRequired,
            ErrorCode::ProductNotFound,
            ErrorCode::ProductInvalidPrice,
            ErrorCode::ProductCodeExists,
            ErrorCode::ProductNameRequired,
            ErrorCode::MasterProductReadOnly,
            ErrorCode::CategoryInvalid,
            ErrorCode::StockTakingNotStarted,
            ErrorCode::StockTakingInProgress,
            ErrorCode::StockTakingItemNotFound,
            ErrorCode::StockTakingFinalizing,
            ErrorCode::InternalError,
            ErrorCode::StoreUnavailable,
            ErrorCode::StoreRejected,
            ErrorCode::SubscriptionFailed,
            ErrorCode::CatalogNotReady,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(ErrorCode::ProductCodeExists.message(), "Product code already exists");
        assert_eq!(ErrorCode::StockTakingFinalizing.message(), "Stock-taking is being finalized");
    }

    #[test]
    fn test_invalid_code() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::ProductCodeExists).unwrap();
        assert_eq!(json, "6004");
        let code: ErrorCode = serde_json::from_str("7002").unwrap();
        assert_eq!(code, ErrorCode::StockTakingInProgress);
    }
}
