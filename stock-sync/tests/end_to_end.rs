//! End-to-end flows: selling, promotion, stock-taking and the
//! last-write-wins stock race.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use shared::error::ErrorCode;
use shared::models::{DiscrepancyKind, ProductCategory, ProductCreate, Session};
use stock_sync::reconciliation::ReconciliationStatus;
use stock_sync::store::{paths, DocumentStore};
use stock_sync::{CatalogError, CatalogView, Config, MemoryStore, PromotionOutcome, SessionState};

fn config() -> Config {
    let mut config = Config::with_overrides("admin", 0);
    config.reconciliation_history_limit = 12;
    config
}

async fn open_with(store: &Arc<MemoryStore>, session: Session, config: Config) -> SessionState {
    let state = SessionState::initialize(store.clone(), session, config).await;
    tokio::time::timeout(Duration::from_secs(2), state.sync.ready())
        .await
        .expect("catalog never became ready")
        .unwrap();
    state
}

async fn open(store: &Arc<MemoryStore>, session: Session) -> SessionState {
    open_with(store, session, config()).await
}

async fn settle(state: &SessionState, predicate: impl FnMut(&CatalogView) -> bool) -> CatalogView {
    tokio::time::timeout(Duration::from_secs(2), state.sync.wait_until(predicate))
        .await
        .expect("view did not converge")
        .unwrap()
}

fn shop() -> Session {
    Session::shop("shop-1", "owner@example.com")
}

fn lager() -> ProductCreate {
    let mut draft = ProductCreate::new("Lager 350ml", "Beer");
    draft.container = Some("can".into());
    draft.cost = Some(dec!(125));
    draft.price = Some(dec!(450));
    draft.stock = Some(24);
    draft.min_stock = Some(10);
    draft
}

#[tokio::test]
async fn lager_is_sold_then_promoted() {
    let store = Arc::new(MemoryStore::new());
    let shop = open(&store, shop()).await;
    let admin = open(&store, Session::admin("root", "admin@example.com")).await;

    let created = shop.catalog.create_product(lager()).await.unwrap();
    assert_eq!(created.category, ProductCategory::Beer);
    assert_eq!(created.product_code, "PROD001");
    settle(&shop, |v| v.find(&created.id).is_some()).await;

    assert_eq!(shop.stock.adjust_stock(&created.id, -5).await.unwrap(), 19);
    let view = settle(&shop, |v| v.find(&created.id).is_some_and(|p| p.stock == 19)).await;
    let before = view.find(&created.id).unwrap().clone();

    // shops cannot promote
    assert!(matches!(
        shop.promotion.promote_to_master("shop-1", &created.id).await,
        Err(CatalogError::Permission { code: ErrorCode::AdminRequired, .. })
    ));

    let outcome = admin.promotion.promote_to_master("shop-1", &created.id).await.unwrap();
    let master = match outcome {
        PromotionOutcome::Promoted(master) => master,
        other => panic!("expected a promotion, got {other:?}"),
    };
    assert_eq!(master.id, created.id);
    assert_eq!(master.product_code, "PROD001");
    assert_eq!(master.stock, 0);
    assert_eq!(master.min_stock, 0);
    assert!(master.is_master);
    assert_eq!(master.price, before.price);
    assert!(master.created_at >= before.created_at);

    let view = settle(&shop, |v| {
        v.own_products.is_empty() && v.master_products.iter().any(|p| p.id == created.id)
    })
    .await;
    let seen = view.find(&created.id).unwrap();
    assert_eq!(seen.stock, 0);
    assert!(seen.is_master);
    assert_eq!(seen.product_code, "PROD001");

    // second call is a no-op success with the same end state
    let again = admin.promotion.promote_to_master("shop-1", &created.id).await.unwrap();
    assert!(matches!(again, PromotionOutcome::AlreadyMaster(_)));
    assert_eq!(again.product().stock, 0);
    assert_eq!(again.product().product_code, "PROD001");
    assert_eq!(store.len(&paths::products("admin")), 1);
    assert_eq!(store.len(&paths::products("shop-1")), 0);

    settle(&admin, |v| v.find(&created.id).is_some()).await;
    let similar = admin.promotion.similar_masters("LAGER");
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].id, created.id);
}

#[tokio::test]
async fn interrupted_promotion_is_completed_on_retry() {
    let store = Arc::new(MemoryStore::new());
    let shop = open(&store, shop()).await;
    let admin = open(&store, Session::admin("root", "admin@example.com")).await;
    let created = shop.catalog.create_product(lager()).await.unwrap();

    // master copy written, shop copy never deleted
    let shop_doc = store.get(&paths::products("shop-1").doc(&created.id)).await.unwrap();
    let mut fields = shop_doc.fields.clone();
    fields.insert("isMaster".into(), true.into());
    store
        .set(&paths::products("admin").doc(&created.id), fields)
        .await
        .unwrap();

    let outcome = admin.promotion.promote_to_master("shop-1", &created.id).await.unwrap();
    assert!(matches!(outcome, PromotionOutcome::AlreadyMaster(_)));
    assert_eq!(store.len(&paths::products("shop-1")), 0);
    settle(&shop, |v| v.own_products.is_empty() && v.master_products.len() == 1).await;
}

#[tokio::test]
async fn promoting_a_missing_record_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let admin = open(&store, Session::admin("root", "admin@example.com")).await;
    let err = admin.promotion.promote_to_master("shop-1", "ghost").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn stock_never_goes_negative() {
    let store = Arc::new(MemoryStore::new());
    let shop = open(&store, shop()).await;
    let mut draft = lager();
    draft.stock = Some(3);
    let product = shop.catalog.create_product(draft).await.unwrap();
    settle(&shop, |v| v.find(&product.id).is_some()).await;

    assert_eq!(shop.stock.adjust_stock(&product.id, -10).await.unwrap(), 0);
    settle(&shop, |v| v.find(&product.id).is_some_and(|p| p.stock == 0)).await;
    assert_eq!(shop.stock.set_stock(&product.id, -7).await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_adjustments_are_last_write_wins() {
    let store = Arc::new(MemoryStore::new());
    let device_a = open(&store, shop()).await;
    let device_b = open(&store, shop()).await;

    let mut draft = lager();
    draft.stock = Some(10);
    let product = device_a.catalog.create_product(draft).await.unwrap();
    settle(&device_a, |v| v.find(&product.id).is_some()).await;
    settle(&device_b, |v| v.find(&product.id).is_some()).await;

    // device B writes before A's change has reached its view; both compute from 10
    let a = device_a.stock.adjust_stock(&product.id, -3).await.unwrap();
    let b = device_b.stock.adjust_stock(&product.id, 5).await.unwrap();
    assert_eq!(a, 7);
    assert_eq!(b, 15);

    // the later write wins; the -3 is lost
    let view = settle(&device_a, |v| v.find(&product.id).is_some_and(|p| p.stock == 15)).await;
    assert_eq!(view.find(&product.id).map(|p| p.stock), Some(15));
    settle(&device_b, |v| v.find(&product.id).is_some_and(|p| p.stock == 15)).await;
}

#[tokio::test]
async fn stock_taking_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let shop = open(&store, shop()).await;

    let counted = shop.catalog.create_product(lager()).await.unwrap();
    settle(&shop, |v| v.own_products.len() == 1).await;
    let mut sake = ProductCreate::new("Junmai", "日本酒");
    sake.cost = Some(dec!(1000));
    sake.price = Some(dec!(1800));
    sake.stock = Some(6);
    let uncounted = shop.catalog.create_product(sake).await.unwrap();
    settle(&shop, |v| v.own_products.len() == 2).await;

    let engine = &shop.reconciliation;
    assert!(matches!(
        engine.record_count(&counted.id, 1),
        Err(CatalogError::InvalidState { code: ErrorCode::StockTakingNotStarted, .. })
    ));

    let progress = engine.start_session().unwrap();
    assert_eq!(progress.total, 2);
    assert!(matches!(
        engine.start_session(),
        Err(CatalogError::InvalidState { code: ErrorCode::StockTakingInProgress, .. })
    ));

    engine.record_count(&counted.id, 30).unwrap();
    let item = engine.record_count(&counted.id, 20).unwrap();
    assert_eq!(item.difference, -4);
    assert!(matches!(engine.record_count(&counted.id, -1), Err(CatalogError::Validation { .. })));
    assert_eq!(engine.status(), ReconciliationStatus::InProgress(engine.progress().unwrap()));
    assert_eq!(engine.progress().unwrap().counted, 1);

    let record = engine.finalize().await.unwrap();
    assert!(!record.id.is_empty());
    assert_eq!(record.taken_by, "owner@example.com");
    assert_eq!(record.shop_id, "shop-1");
    let lager_item = record.items.iter().find(|i| i.product_id == counted.id).unwrap();
    assert_eq!(lager_item.kind, DiscrepancyKind::Shortage);
    let sake_item = record.items.iter().find(|i| i.product_id == uncounted.id).unwrap();
    assert_eq!(sake_item.difference, 0);
    assert_eq!(sake_item.actual_stock, 6);
    assert_eq!(record.analysis.discrepant_items, 1);
    assert_eq!(record.analysis.discrepancy_value, dec!(-500));
    assert_eq!(engine.status(), ReconciliationStatus::Finalized);

    let history = engine.history().recent().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, record.id);
    assert_eq!(history[0].items.len(), 2);

    assert_eq!(engine.apply_counts(&record).await.unwrap(), 1);
    settle(&shop, |v| v.find(&counted.id).is_some_and(|p| p.stock == 20)).await;
}

#[tokio::test]
async fn empty_count_finalizes_with_zero_drift() {
    let store = Arc::new(MemoryStore::new());
    let shop = open(&store, shop()).await;
    shop.catalog.create_product(lager()).await.unwrap();
    settle(&shop, |v| v.own_products.len() == 1).await;

    shop.reconciliation.start_session().unwrap();
    let record = shop.reconciliation.finalize().await.unwrap();
    assert_eq!(record.analysis.counted_items, 0);
    assert_eq!(record.analysis.discrepant_items, 0);
    assert!(record.items.iter().all(|i| i.difference == 0));
}

#[tokio::test]
async fn cancel_and_failed_finalize_keep_session_consistent() {
    let store = Arc::new(MemoryStore::new());
    let shop = open(&store, shop()).await;
    let product = shop.catalog.create_product(lager()).await.unwrap();
    settle(&shop, |v| v.own_products.len() == 1).await;

    let engine = &shop.reconciliation;
    engine.start_session().unwrap();
    engine.cancel().unwrap();
    assert_eq!(engine.status(), ReconciliationStatus::NotStarted);
    assert!(engine.cancel().is_err());

    engine.start_session().unwrap();
    engine.record_count(&product.id, 1).unwrap();
    store.fail_writes(Some(stock_sync::StoreError::Rejected("quota".into())));
    assert!(engine.finalize().await.is_err());
    assert!(matches!(engine.status(), ReconciliationStatus::InProgress(_)));

    store.fail_writes(None);
    let record = engine.finalize().await.unwrap();
    assert_eq!(record.analysis.counted_items, 1);
}

#[tokio::test]
async fn history_is_newest_first_and_bounded() {
    let store = Arc::new(MemoryStore::new());
    let mut config = config();
    config.reconciliation_history_limit = 2;
    let shop = open_with(&store, shop(), config).await;

    for _ in 0..3 {
        shop.reconciliation.start_session().unwrap();
        shop.reconciliation.finalize().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let recent = shop.reconciliation.history().recent().await.unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent[0].finalized_at >= recent[1].finalized_at);
    let latest = shop.reconciliation.history().latest().await.unwrap().unwrap();
    assert_eq!(latest.id, recent[0].id);
    assert_eq!(shop.reconciliation.last_record().map(|r| r.id), Some(latest.id));
}

#[tokio::test]
async fn report_matches_reference_portfolio() {
    let store = Arc::new(MemoryStore::new());
    let shop = open(&store, shop()).await;

    let mut first = ProductCreate::new("First", "wine");
    first.cost = Some(dec!(100));
    first.price = Some(dec!(200));
    first.stock = Some(5);
    first.min_stock = Some(2);
    shop.catalog.create_product(first).await.unwrap();
    settle(&shop, |v| v.own_products.len() == 1).await;

    let mut second = ProductCreate::new("Second", "wine");
    second.cost = Some(dec!(50));
    second.price = Some(dec!(80));
    second.min_stock = Some(3);
    shop.catalog.create_product(second).await.unwrap();
    settle(&shop, |v| v.own_products.len() == 2).await;

    let report = shop.report();
    assert_eq!(report.total_value, dec!(500));
    assert_eq!(report.total_potential_profit, dec!(500));
    assert_eq!(report.low_stock_count, 0);
    assert_eq!(report.out_of_stock_count, 1);
}
