//! Product catalog - record model, live merged view, queries and writes

pub mod onboarding;
pub mod query;
pub mod record;
pub mod service;
pub mod synchronizer;

pub use onboarding::{Onboarding, OnboardingGroup};
pub use service::CatalogService;
pub use synchronizer::{CatalogSynchronizer, CatalogView, Half, HalfState};
