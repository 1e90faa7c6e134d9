//! Document store abstraction
//!
//! The catalog only needs a document-oriented store with live collection
//! subscriptions and single-document mutations:
//!
//! ```text
//! subscribe(collection, filter?) ──▶ Subscription (full snapshot per change)
//! get / list                     ──▶ one-shot reads (idempotent, retried)
//! create / set / update / delete ──▶ mutations (never retried)
//! ```
//!
//! [`MemoryStore`] is the in-process implementation used by the demo binary
//! and the tests.

pub mod memory;
pub mod paths;

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::error::ErrorCode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use memory::MemoryStore;

/// Document body
pub type Fields = serde_json::Map<String, Value>;

/// Full, ordered result set delivered on every change
pub type Snapshot = Vec<Document>;

/// Store transport errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable or timed out
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Write refused (rules, quota, malformed document)
    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("document not found: {0}")]
    Missing(String),

    #[error("subscription closed")]
    Closed,
}

impl StoreError {
    /// Worth repeating an idempotent read
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unavailable(_) => ErrorCode::StoreUnavailable,
            Self::Rejected(_) => ErrorCode::StoreRejected,
            Self::Missing(_) => ErrorCode::NotFound,
            Self::Closed => ErrorCode::SubscriptionFailed,
        }
    }
}

/// Slash-separated collection path, e.g. `shops/s1/products`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub collection: CollectionPath,
    pub id: String,
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Stored document with its store-assigned id
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode the body; the id is not part of it
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

/// Server-side filter predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `fields[field] == value`; a missing field never matches
    Eq { field: String, value: Value },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Self::Eq { field, value } => fields.get(field) == Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: CollectionPath,
    pub filter: Option<Filter>,
}

impl Query {
    pub fn all(collection: CollectionPath) -> Self {
        Self {
            collection,
            filter: None,
        }
    }

    pub fn filtered(collection: CollectionPath, filter: Filter) -> Self {
        Self {
            collection,
            filter: Some(filter),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(fields))
    }
}

/// Live query handle
///
/// Yields a full snapshot on every change. An `Err` item ends the stream.
/// Dropping the handle tears the listener down.
pub struct Subscription {
    rx: mpsc::Receiver<Result<Snapshot, StoreError>>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<Result<Snapshot, StoreError>>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Stop the listener without dropping the handle
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Stream for Subscription {
    type Item = Result<Snapshot, StoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Read/subscribe/write contract of a document-oriented store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a live query; the first item is the current result set
    async fn subscribe(&self, query: Query, buffer: usize) -> Result<Subscription, StoreError>;

    /// `StoreError::Missing` when the document does not exist
    async fn get(&self, path: &DocumentPath) -> Result<Document, StoreError>;

    async fn list(&self, query: &Query) -> Result<Snapshot, StoreError>;

    /// Insert with a store-assigned id
    async fn create(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError>;

    /// Insert or overwrite under a known id
    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError>;

    /// Merge `fields` into an existing document
    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError>;

    /// Deleting a missing document succeeds
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;
}
