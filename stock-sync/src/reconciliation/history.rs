//! Append-only stock-taking history per shop

use std::sync::Arc;

use serde_json::Value;
use shared::error::ErrorCode;
use shared::models::ReconciliationRecord;

use crate::store::{paths, CollectionPath, Document, DocumentStore, Query};
use crate::utils::{CatalogError, CatalogResult, RetryPolicy};

fn decode(doc: &Document) -> Result<ReconciliationRecord, serde_json::Error> {
    let mut record: ReconciliationRecord = doc.decode()?;
    record.id = doc.id.clone();
    Ok(record)
}

#[derive(Clone)]
pub struct ReconciliationHistory {
    store: Arc<dyn DocumentStore>,
    collection: CollectionPath,
    limit: usize,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ReconciliationHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationHistory")
            .field("collection", &self.collection)
            .field("limit", &self.limit)
            .finish()
    }
}

impl ReconciliationHistory {
    pub fn new(store: Arc<dyn DocumentStore>, namespace: &str, limit: usize, retry: RetryPolicy) -> Self {
        Self {
            store,
            collection: paths::reconciliations(namespace),
            limit,
            retry,
        }
    }

    /// Persist a finalized record; returns the store id
    pub async fn append(&self, record: &ReconciliationRecord) -> CatalogResult<String> {
        let fields = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            _ => {
                return Err(CatalogError::validation(
                    ErrorCode::InternalError,
                    "record did not serialize to an object",
                ));
            }
        };
        let id = self.store.create(&self.collection, fields).await?;
        tracing::info!(
            record_id = %id,
            date = %record.date,
            discrepancies = record.analysis.discrepant_items,
            "Stock-taking record saved"
        );
        Ok(id)
    }

    /// Most recent records, newest first
    pub async fn recent(&self) -> CatalogResult<Vec<ReconciliationRecord>> {
        let query = Query::all(self.collection.clone());
        let store = self.store.clone();
        let docs = self
            .retry
            .run("list", || {
                let store = store.clone();
                let query = query.clone();
                async move { store.list(&query).await }
            })
            .await?;

        let mut records: Vec<ReconciliationRecord> = docs
            .iter()
            .filter_map(|doc| match decode(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(doc_id = %doc.id, "Skipping undecodable stock-taking record: {e}");
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(b.finalized_at.cmp(&a.finalized_at))
        });
        records.truncate(self.limit);
        Ok(records)
    }

    pub async fn latest(&self) -> CatalogResult<Option<ReconciliationRecord>> {
        Ok(self.recent().await?.into_iter().next())
    }
}
