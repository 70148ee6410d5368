//! # In-memory event store.
//!
//! [`InMemoryStore`] keeps documents in a `HashMap` behind a `tokio::sync::RwLock`.
//! Each trait write takes the write lock once, so it is atomic per document and
//! leaves untouched fields alone.
//!
//! Besides the [`EventStore`] contract it exposes the operations an embedding
//! application needs to play the external collaborator: `insert`, `update`,
//! `remove`, `get`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{EventDocument, EventId};
use crate::store::{EventStore, FieldUpdate, Occurrence};

/// Thread-safe in-memory document collection.
#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, EventDocument>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document keyed by its id.
    pub async fn insert(&self, doc: EventDocument) {
        self.docs.write().await.insert(doc.id.clone(), doc);
    }

    /// Applies an arbitrary edit to one document, as an external actor would.
    ///
    /// Returns `false` if the document does not exist.
    pub async fn update<F>(&self, id: &str, edit: F) -> bool
    where
        F: FnOnce(&mut EventDocument),
    {
        match self.docs.write().await.get_mut(id) {
            Some(doc) => {
                edit(doc);
                true
            }
            None => false,
        }
    }

    /// Removes a document.
    pub async fn remove(&self, id: &str) -> Option<EventDocument> {
        self.docs.write().await.remove(id)
    }

    /// Returns a copy of one document.
    pub async fn get(&self, id: &str) -> Option<EventDocument> {
        self.docs.read().await.get(id).cloned()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    /// Returns true if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn list_active_events(&self) -> Result<Vec<EventDocument>, StoreError> {
        let docs = self.docs.read().await;
        let mut active: Vec<EventDocument> = docs.values().filter(|d| d.active).cloned().collect();
        active.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        Ok(active)
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<EventDocument>, StoreError> {
        Ok(self.docs.read().await.get(id.as_str()).cloned())
    }

    async fn set_field(&self, id: &EventId, update: FieldUpdate) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(id.as_str()).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;
        match update {
            FieldUpdate::ReminderSent { key, sent } => {
                doc.reminders_sent.insert(key.to_string(), sent);
            }
        }
        Ok(())
    }

    async fn replace_fields(&self, id: &EventId, occurrence: Occurrence) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(id.as_str()).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;
        doc.start_time = occurrence.start_time;
        doc.reminders_sent = occurrence
            .reminders_sent
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Ok(())
    }
}
