//! Demo: one shop and one administrator sharing an in-memory store

use std::sync::Arc;

use shared::models::{ProductCreate, Session};
use stock_sync::{Config, MemoryStore, SessionState, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(&config.log_level, config.is_production(), config.log_dir.as_deref());

    tracing::info!(environment = %config.environment, "🍺 Stock sync demo starting...");

    let store = Arc::new(MemoryStore::new());
    let shop = SessionState::initialize(
        store.clone(),
        Session::shop("shop-demo", "owner@example.com"),
        config.clone(),
    )
    .await;
    let admin = SessionState::initialize(
        store.clone(),
        Session::admin("admin-demo", "admin@example.com"),
        config.clone(),
    )
    .await;
    shop.sync.ready().await?;
    admin.sync.ready().await?;

    let mut draft = ProductCreate::new("Lager 350ml", "beer");
    draft.container = Some("can".into());
    draft.cost = Some(125.into());
    draft.price = Some(450.into());
    draft.stock = Some(24);
    draft.min_stock = Some(10);
    let product = shop.catalog.create_product(draft).await?;
    shop.sync.wait_until(|v| v.find(&product.id).is_some()).await?;

    let stock = shop.stock.adjust_stock(&product.id, -5).await?;
    tracing::info!(product_code = %product.product_code, stock, "Sold five cans");
    shop.sync
        .wait_until(|v| v.find(&product.id).is_some_and(|p| p.stock == stock))
        .await?;

    shop.reconciliation.start_session()?;
    shop.reconciliation.record_count(&product.id, 18)?;
    let record = shop.reconciliation.finalize().await?;
    tracing::info!(
        discrepancies = record.analysis.discrepant_items,
        net_difference = record.analysis.net_difference,
        "Stock-taking done"
    );

    let report = shop.report();
    for recommendation in &report.recommendations {
        tracing::info!(level = ?recommendation.level, "{}", recommendation.message);
    }

    let outcome = admin
        .promotion
        .promote_to_master(shop.sync.own_namespace(), &product.id)
        .await?;
    let master = outcome.product();
    tracing::info!(
        product_code = %master.product_code,
        stock = master.stock,
        "Promoted to master catalog"
    );

    shop.shutdown().await;
    admin.shutdown().await;
    Ok(())
}
