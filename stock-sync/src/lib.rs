//! Stock Sync - beverage catalog synchronization and stock-taking
//!
//! # 架构概述
//!
//! - **Catalog** (`catalog`): merged live view of shop and master products,
//!   record validation, queries, create/update/delete, onboarding
//! - **Inventory** (`inventory`): bounded stock writes, master promotion
//! - **Reconciliation** (`reconciliation`): stock-taking sessions and history
//! - **Analytics** (`analytics`): portfolio and category statistics
//! - **Store** (`store`): document store contract and in-memory backend
//!
//! # 模块结构
//!
//! ```text
//! stock-sync/src/
//! ├── core/            # 配置、会话状态
//! ├── store/           # DocumentStore trait, MemoryStore
//! ├── catalog/         # synchronizer, record, query, service, onboarding
//! ├── inventory/       # stock mutator, promotion
//! ├── reconciliation/  # stock-taking engine, history
//! ├── analytics/       # aggregator
//! └── utils/           # error, logger, retry
//! ```
//!
//! Data flows one way: a mutation is awaited, and the next snapshot from
//! the store is what updates the view.

pub mod analytics;
pub mod catalog;
pub mod core;
pub mod inventory;
pub mod reconciliation;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use catalog::{CatalogService, CatalogSynchronizer, CatalogView, HalfState};
pub use core::{Config, SessionState};
pub use inventory::{PromotionEngine, PromotionOutcome, StockMutator};
pub use reconciliation::ReconciliationEngine;
pub use store::{DocumentStore, MemoryStore, StoreError};
pub use utils::{CatalogError, CatalogResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
