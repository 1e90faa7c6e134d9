//! In-process document store
//!
//! ```text
//! MemoryStore
//!   └── collections: path → Collection
//!         ├── docs: id → Fields
//!         └── broadcast: Sender<StoreEvent> (fan-out to live subscriptions)
//!                │
//!                ▼
//!           listener task per Subscription (re-query → push full snapshot)
//! ```
//!
//! Fault injection hooks make transport failures reproducible in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use super::{
    CollectionPath, Document, DocumentPath, DocumentStore, Fields, Query, Snapshot, StoreError,
    Subscription,
};

/// Broadcast channel capacity; a lagging listener just re-queries
const BROADCAST_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
enum StoreEvent {
    Changed,
    /// Injected failure; listeners forward it and stop
    Fault(StoreError),
}

struct Collection {
    docs: DashMap<String, Fields>,
    tx: broadcast::Sender<StoreEvent>,
}

impl Collection {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            docs: DashMap::new(),
            tx,
        }
    }

    fn snapshot(&self, query: &Query) -> Snapshot {
        let mut docs: Vec<Document> = self
            .docs
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| Document::new(entry.key().clone(), entry.value().clone()))
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs
    }

    fn notify(&self) {
        // no subscribers is fine
        let _ = self.tx.send(StoreEvent::Changed);
    }
}

#[derive(Default)]
struct Faults {
    /// Remaining get/list calls that fail with `Unavailable`
    failing_reads: AtomicU32,
    /// Every write fails with this error while set
    write_error: Mutex<Option<StoreError>>,
}

/// In-memory [`DocumentStore`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// collection path → Collection
    collections: Arc<DashMap<String, Arc<Collection>>>,
    faults: Arc<Faults>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("collections", &self.collections.len())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, path: &CollectionPath) -> Arc<Collection> {
        self.collections
            .entry(path.as_str().to_string())
            .or_insert_with(|| Arc::new(Collection::new()))
            .clone()
    }

    fn existing(&self, path: &CollectionPath) -> Option<Arc<Collection>> {
        self.collections.get(path.as_str()).map(|c| c.value().clone())
    }

    /// Number of documents in a collection
    pub fn len(&self, path: &CollectionPath) -> usize {
        self.existing(path).map(|c| c.docs.len()).unwrap_or(0)
    }

    /// Break every live subscription on `path` with `err`
    pub fn fail_subscriptions(&self, path: &CollectionPath, err: StoreError) {
        let collection = self.collection(path);
        let _ = collection.tx.send(StoreEvent::Fault(err));
    }

    /// Make the next `count` reads fail with a transient error
    pub fn fail_next_reads(&self, count: u32) {
        self.faults.failing_reads.store(count, Ordering::SeqCst);
    }

    /// Fail all writes with `err` until cleared with `None`
    pub fn fail_writes(&self, err: Option<StoreError>) {
        *self.faults.write_error.lock() = err;
    }

    fn check_read(&self) -> Result<(), StoreError> {
        let failing = self
            .faults
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match failing {
            Ok(_) => Err(StoreError::Unavailable("injected read failure".into())),
            Err(_) => Ok(()),
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        match self.faults.write_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn run_listener(
    collection: Arc<Collection>,
    query: Query,
    mut events: broadcast::Receiver<StoreEvent>,
    tx: mpsc::Sender<Result<Snapshot, StoreError>>,
    cancel: CancellationToken,
) {
    if tx.send(Ok(collection.snapshot(&query))).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => {
                let item = match event {
                    Ok(StoreEvent::Changed) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        Ok(collection.snapshot(&query))
                    }
                    Ok(StoreEvent::Fault(err)) => Err(err),
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let stop = item.is_err();
                if tx.send(item).await.is_err() || stop {
                    break;
                }
            }
        }
    }
    tracing::debug!(collection = %query.collection, "Listener stopped");
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(&self, query: Query, buffer: usize) -> Result<Subscription, StoreError> {
        self.check_read()?;
        let collection = self.collection(&query.collection);
        // subscribe before the first snapshot so no change slips between
        let events = collection.tx.subscribe();
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let cancel = CancellationToken::new();

        tokio::spawn(run_listener(collection, query, events, tx, cancel.clone()));

        Ok(Subscription::new(rx, cancel))
    }

    async fn get(&self, path: &DocumentPath) -> Result<Document, StoreError> {
        self.check_read()?;
        let fields = self
            .existing(&path.collection)
            .and_then(|c| c.docs.get(&path.id).map(|d| d.value().clone()));
        fields
            .map(|fields| Document::new(path.id.clone(), fields))
            .ok_or_else(|| StoreError::Missing(path.to_string()))
    }

    async fn list(&self, query: &Query) -> Result<Snapshot, StoreError> {
        self.check_read()?;
        Ok(self
            .existing(&query.collection)
            .map(|c| c.snapshot(query))
            .unwrap_or_default())
    }

    async fn create(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        self.check_write()?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let target = self.collection(collection);
        target.docs.insert(id.clone(), fields);
        target.notify();
        Ok(id)
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.check_write()?;
        let target = self.collection(&path.collection);
        target.docs.insert(path.id.clone(), fields);
        target.notify();
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.check_write()?;
        let target = self.collection(&path.collection);
        {
            let mut doc = target
                .docs
                .get_mut(&path.id)
                .ok_or_else(|| StoreError::Missing(path.to_string()))?;
            doc.extend(fields);
        }
        target.notify();
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.check_write()?;
        let target = self.collection(&path.collection);
        if target.docs.remove(&path.id).is_some() {
            target.notify();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Filter;
    use futures::StreamExt;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_subscription_receives_full_snapshots() {
        let store = MemoryStore::new();
        let path = CollectionPath::new("shops/s1/products");
        let mut sub = store.subscribe(Query::all(path.clone()), 8).await.unwrap();

        assert!(sub.next().await.unwrap().unwrap().is_empty());

        let id = store.create(&path, fields(json!({ "name": "A" }))).await.unwrap();
        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);

        store
            .update(&path.doc(&id), fields(json!({ "stock": 3 })))
            .await
            .unwrap();
        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot[0].fields["name"], "A");
        assert_eq!(snapshot[0].fields["stock"], 3);
    }

    #[tokio::test]
    async fn test_filtered_subscription() {
        let store = MemoryStore::new();
        let path = CollectionPath::new("shops/admin/products");
        store
            .set(&path.doc("m"), fields(json!({ "isMaster": true })))
            .await
            .unwrap();
        store
            .set(&path.doc("d"), fields(json!({ "isMaster": false })))
            .await
            .unwrap();

        let query = Query::filtered(path, Filter::eq("isMaster", true));
        let mut sub = store.subscribe(query, 8).await.unwrap();
        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "m");
    }

    #[tokio::test]
    async fn test_injected_subscription_fault_ends_stream() {
        let store = MemoryStore::new();
        let path = CollectionPath::new("shops/s1/products");
        let mut sub = store.subscribe(Query::all(path.clone()), 8).await.unwrap();
        sub.next().await.unwrap().unwrap();

        store.fail_subscriptions(&path, StoreError::Unavailable("network".into()));
        assert!(matches!(sub.next().await, Some(Err(StoreError::Unavailable(_)))));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_and_get_missing() {
        let store = MemoryStore::new();
        let path = CollectionPath::new("shops/s1/products").doc("nope");
        assert!(matches!(
            store.update(&path, Fields::new()).await,
            Err(StoreError::Missing(_))
        ));
        assert!(matches!(store.get(&path).await, Err(StoreError::Missing(_))));
        assert!(store.delete(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryStore::new();
        let path = CollectionPath::new("c");
        store.fail_next_reads(1);
        assert!(store.list(&Query::all(path.clone())).await.is_err());
        assert!(store.list(&Query::all(path.clone())).await.is_ok());

        store.fail_writes(Some(StoreError::Rejected("quota".into())));
        assert!(store.create(&path, Fields::new()).await.is_err());
        store.fail_writes(None);
        assert!(store.create(&path, Fields::new()).await.is_ok());
        assert_eq!(store.len(&path), 1);
    }
}
