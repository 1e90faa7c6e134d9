//! Merged live view of shop and master products
//!
//! ```text
//! shops/{own}/products ───────────────▶ own listener ───┐
//!                                                        ├─▶ watch::Sender<CatalogView>
//! shops/{admin}/products [isMaster] ──▶ master listener ┘        │
//!                                                                 ▼
//!                                           mutator / promotion / analytics / stock-taking
//! ```
//!
//! Each listener replaces its half wholesale on every snapshot. A failed
//! listener freezes its half at the last good snapshot and flags the error;
//! the other half keeps updating.

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use shared::error::ErrorCode;
use shared::models::{Product, Session};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::record;
use crate::core::Config;
use crate::store::{paths, CollectionPath, DocumentPath, DocumentStore, Filter, Query, Snapshot, StoreError, Subscription};
use crate::utils::{CatalogError, CatalogResult, RetryPolicy};

/// Which subscription a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Half {
    /// Caller's own namespace
    Own,
    /// Administrator namespace, `isMaster == true`
    Master,
}

/// Sync state of one half
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HalfState {
    /// No snapshot received yet
    #[default]
    Loading,
    Live,
    /// Listener failed; products frozen at the last good snapshot
    Error(String),
}

impl HalfState {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Merged catalog as seen by one session
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    pub own_products: Vec<Product>,
    pub master_products: Vec<Product>,
    pub own_state: HalfState,
    pub master_state: HalfState,
}

impl CatalogView {
    /// Own records followed by master records, no de-duplication
    pub fn all_products(&self) -> impl Iterator<Item = &Product> {
        self.own_products.iter().chain(self.master_products.iter())
    }

    pub fn len(&self) -> usize {
        self.own_products.len() + self.master_products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a record by id, own half first
    pub fn locate(&self, product_id: &str) -> Option<(&Product, Half)> {
        self.own_products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| (p, Half::Own))
            .or_else(|| {
                self.master_products
                    .iter()
                    .find(|p| p.id == product_id)
                    .map(|p| (p, Half::Master))
            })
    }

    pub fn find(&self, product_id: &str) -> Option<&Product> {
        self.locate(product_id).map(|(p, _)| p)
    }

    pub fn products(&self, half: Half) -> &[Product] {
        match half {
            Half::Own => &self.own_products,
            Half::Master => &self.master_products,
        }
    }

    pub fn state(&self, half: Half) -> &HalfState {
        match half {
            Half::Own => &self.own_state,
            Half::Master => &self.master_state,
        }
    }

    /// Both halves have delivered at least one snapshot (or failed)
    pub fn is_ready(&self) -> bool {
        self.own_state != HalfState::Loading && self.master_state != HalfState::Loading
    }

    fn replace(&mut self, half: Half, products: Vec<Product>) {
        match half {
            Half::Own => {
                self.own_products = products;
                self.own_state = HalfState::Live;
            }
            Half::Master => {
                self.master_products = products;
                self.master_state = HalfState::Live;
            }
        }
    }

    fn set_state(&mut self, half: Half, state: HalfState) {
        match half {
            Half::Own => self.own_state = state,
            Half::Master => self.master_state = state,
        }
    }
}

/// Name order within a half: case-folded name, then raw name, then id
pub fn sort_products(products: &mut [Product]) {
    products.sort_by_cached_key(|p| (p.name.to_lowercase(), p.name.clone(), p.id.clone()));
}

fn decode_snapshot(half: Half, snapshot: Snapshot) -> Vec<Product> {
    let mut products: Vec<Product> = snapshot
        .iter()
        .filter_map(|doc| match record::from_document(doc) {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::warn!(?half, doc_id = %doc.id, "Skipping undecodable product: {e}");
                None
            }
        })
        .collect();
    sort_products(&mut products);
    products
}

/// Owns both catalog subscriptions for one session
pub struct CatalogSynchronizer {
    store: Arc<dyn DocumentStore>,
    session: Session,
    config: Config,
    own_namespace: String,
    view_tx: Arc<watch::Sender<CatalogView>>,
    shutdown_token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for CatalogSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let view = self.view_tx.borrow();
        f.debug_struct("CatalogSynchronizer")
            .field("session", &self.session.id)
            .field("own_products", &view.own_products.len())
            .field("master_products", &view.master_products.len())
            .finish()
    }
}

impl CatalogSynchronizer {
    /// Open both subscriptions for `session`
    ///
    /// A subscription that cannot be established marks its half as failed
    /// instead of failing the whole view.
    pub async fn start(store: Arc<dyn DocumentStore>, session: Session, config: Config) -> Self {
        let own_namespace = if session.is_admin {
            config.admin_namespace.clone()
        } else {
            session.id.clone()
        };
        let (view_tx, _) = watch::channel(CatalogView::default());

        let sync = Self {
            store,
            session,
            config,
            own_namespace,
            view_tx: Arc::new(view_tx),
            shutdown_token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        };

        for half in [Half::Own, Half::Master] {
            sync.spawn_listener(half).await;
        }

        tracing::info!(
            user = %sync.session.id,
            namespace = %sync.own_namespace,
            is_admin = sync.session.is_admin,
            "Catalog synchronizer started"
        );
        sync
    }

    fn query(&self, half: Half) -> Query {
        match half {
            // an admin's own namespace also holds the master records
            Half::Own if self.is_admin_namespace() => Query::filtered(
                paths::products(&self.own_namespace),
                Filter::eq("isMaster", false),
            ),
            Half::Own => Query::all(paths::products(&self.own_namespace)),
            Half::Master => Query::filtered(
                paths::products(&self.config.admin_namespace),
                Filter::eq("isMaster", true),
            ),
        }
    }

    async fn open(&self, half: Half) -> Result<Subscription, StoreError> {
        let query = self.query(half);
        let buffer = self.config.snapshot_buffer;
        let store = self.store.clone();
        self.retry_policy()
            .run("subscribe", || {
                let store = store.clone();
                let query = query.clone();
                async move { store.subscribe(query, buffer).await }
            })
            .await
    }

    async fn spawn_listener(&self, half: Half) {
        match self.open(half).await {
            Ok(subscription) => {
                let task = tokio::spawn(run_listener(
                    half,
                    subscription,
                    self.view_tx.clone(),
                    self.shutdown_token.child_token(),
                ));
                self.tasks.lock().push(task);
            }
            Err(e) => {
                tracing::error!(?half, "Failed to open catalog subscription: {e}");
                self.view_tx
                    .send_modify(|view| view.set_state(half, HalfState::Error(e.to_string())));
            }
        }
    }

    /// Reopen a half whose listener failed
    pub async fn resubscribe(&self, half: Half) {
        if !self.view_tx.borrow().state(half).is_error() {
            return;
        }
        tracing::info!(?half, "Resubscribing catalog half");
        self.spawn_listener(half).await;
    }

    /// Current merged view
    pub fn view(&self) -> CatalogView {
        self.view_tx.borrow().clone()
    }

    /// Receiver that observes every view change
    pub fn watch(&self) -> watch::Receiver<CatalogView> {
        self.view_tx.subscribe()
    }

    /// Wait until the view satisfies `predicate`
    pub async fn wait_until(
        &self,
        mut predicate: impl FnMut(&CatalogView) -> bool,
    ) -> CatalogResult<CatalogView> {
        let mut rx = self.view_tx.subscribe();
        let view = rx
            .wait_for(|view| predicate(view))
            .await
            .map_err(|_| CatalogError::Transport(StoreError::Closed))?;
        Ok(view.clone())
    }

    /// Current view for code generation and uniqueness checks
    ///
    /// Fails while a half is still loading. A failed half serves its last
    /// good snapshot, so codes added to it since then are not seen.
    pub fn loaded_view(&self) -> CatalogResult<CatalogView> {
        let view = self.view();
        if !view.is_ready() {
            return Err(CatalogError::invalid_state(
                ErrorCode::CatalogNotReady,
                "catalog has not received its first snapshot",
            ));
        }
        for half in [Half::Own, Half::Master] {
            if let HalfState::Error(reason) = view.state(half) {
                tracing::warn!(?half, %reason, "Checking product codes against a stale catalog half");
            }
        }
        Ok(view)
    }

    /// Wait for the first snapshot (or failure) of both halves
    pub async fn ready(&self) -> CatalogResult<CatalogView> {
        self.wait_until(CatalogView::is_ready).await
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config)
    }

    /// Namespace the caller writes its own records to
    pub fn own_namespace(&self) -> &str {
        &self.own_namespace
    }

    pub fn admin_namespace(&self) -> &str {
        &self.config.admin_namespace
    }

    fn is_admin_namespace(&self) -> bool {
        self.own_namespace == self.config.admin_namespace
    }

    pub fn collection(&self, half: Half) -> CollectionPath {
        match half {
            Half::Own => paths::products(&self.own_namespace),
            Half::Master => paths::products(&self.config.admin_namespace),
        }
    }

    pub fn document(&self, half: Half, product_id: &str) -> DocumentPath {
        self.collection(half).doc(product_id)
    }

    /// Resolve a record the caller may write to
    ///
    /// Own records are always writable; master records only for admins.
    pub fn writable(&self, product_id: &str) -> CatalogResult<(Product, DocumentPath)> {
        let view = self.view_tx.borrow();
        match view.locate(product_id) {
            Some((product, Half::Own)) => Ok((product.clone(), self.document(Half::Own, product_id))),
            Some((product, Half::Master)) if self.session.is_admin => {
                Ok((product.clone(), self.document(Half::Master, product_id)))
            }
            Some((_, Half::Master)) => Err(CatalogError::permission(
                ErrorCode::MasterProductReadOnly,
                format!("product {product_id} is a master record"),
            )),
            None => Err(CatalogError::product_not_found(product_id)),
        }
    }

    /// Tear down both subscriptions
    pub fn shutdown(&self) {
        if !self.shutdown_token.is_cancelled() {
            tracing::info!(user = %self.session.id, "Catalog synchronizer shutting down");
            self.shutdown_token.cancel();
        }
    }

    /// Shut down and wait for the listeners to exit
    pub async fn join(&self) {
        self.shutdown();
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }
    }
}

impl Drop for CatalogSynchronizer {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

async fn run_listener(
    half: Half,
    mut subscription: Subscription,
    view_tx: Arc<watch::Sender<CatalogView>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            next = subscription.next() => match next {
                Some(Ok(snapshot)) => {
                    let products = decode_snapshot(half, snapshot);
                    tracing::debug!(?half, count = products.len(), "Catalog snapshot received");
                    view_tx.send_modify(|view| view.replace(half, products));
                }
                Some(Err(e)) => {
                    tracing::warn!(?half, "Catalog subscription failed: {e}");
                    view_tx.send_modify(|view| view.set_state(half, HalfState::Error(e.to_string())));
                    break;
                }
                None => {
                    tracing::warn!(?half, "Catalog subscription closed");
                    view_tx.send_modify(|view| {
                        view.set_state(half, HalfState::Error(StoreError::Closed.to_string()))
                    });
                    break;
                }
            }
        }
    }
}
