//! Stock mutation and master promotion

pub mod mutator;
pub mod promotion;

pub use mutator::StockMutator;
pub use promotion::{PromotionEngine, PromotionOutcome};
