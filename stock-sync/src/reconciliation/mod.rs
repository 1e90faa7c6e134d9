//! Stock-taking: baseline capture, counting, finalization and history

pub mod history;
pub mod session;

pub use history::ReconciliationHistory;
pub use session::{Progress, ReconciliationEngine, ReconciliationStatus, StockTaking};
