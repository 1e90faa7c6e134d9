//! 工具模块 - 错误类型、日志、重试

pub mod error;
pub mod logger;
pub mod retry;

pub use error::{CatalogError, CatalogResult};
pub use retry::RetryPolicy;
