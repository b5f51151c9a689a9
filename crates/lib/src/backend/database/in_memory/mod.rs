//! In-memory database backend implementation
//!
//! This module provides an in-memory implementation of the `BackendImpl` trait,
//! suitable for testing, development, or single-node deployments that persist
//! by snapshotting the whole state to a JSON file.

mod persistence;

use std::any::Any;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::{BackendError, BackendImpl, Document, Filter, document_id, key_text};
use crate::constants::ID_FIELD;

/// Documents and index definitions of one collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct CollectionState {
    /// Documents in insertion order
    pub(crate) documents: Vec<Document>,
    /// Fields registered through `create_unique_index`
    #[serde(default)]
    pub(crate) unique_fields: BTreeSet<String>,
}

impl CollectionState {
    /// Rejects `document` if it collides with a stored `_id` or unique field value.
    fn check_unique(&self, collection: &str, id: &str, document: &Document) -> Result<()> {
        for existing in &self.documents {
            if existing.get(ID_FIELD).and_then(|v| v.as_str()) == Some(id) {
                return Err(BackendError::DuplicateKey {
                    collection: collection.to_string(),
                    field: ID_FIELD.to_string(),
                    value: key_text(&serde_json::Value::String(id.to_string())),
                }
                .into());
            }
            for field in &self.unique_fields {
                if let Some(value) = document.get(field)
                    && existing.get(field) == Some(value)
                {
                    return Err(BackendError::DuplicateKey {
                        collection: collection.to_string(),
                        field: field.clone(),
                        value: key_text(value),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

/// A simple in-memory document store.
///
/// Every collection lives behind a single `RwLock`, which makes each write,
/// including the uniqueness checks of `insert_one`, atomic.
///
/// It provides basic persistence capabilities via `save_to_file` and
/// `load_from_file`, serializing all collections to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) collections: RwLock<HashMap<String, CollectionState>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves all collections to a specified file as JSON.
    ///
    /// The file is written to a temporary sibling first and then renamed into place.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads the database state from a specified JSON file.
    ///
    /// If the file does not exist, a new, empty `InMemory` database is returned.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

#[async_trait]
impl BackendImpl for InMemory {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|state| {
                state
                    .documents
                    .iter()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|state| {
            state
                .documents
                .iter()
                .find(|doc| filter.matches(doc))
                .cloned()
        }))
    }

    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(state) = collections.get_mut(collection) else {
            return Ok(None);
        };
        Ok(state
            .documents
            .iter()
            .position(|doc| filter.matches(doc))
            .map(|index| state.documents.remove(index)))
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<()> {
        let id = document_id(collection, &document)?;
        let mut collections = self.collections.write().await;
        let state = collections.entry(collection.to_string()).or_default();
        state.check_unique(collection, &id, &document)?;
        state.documents.push(document);
        Ok(())
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let state = collections.entry(collection.to_string()).or_default();
        if state.unique_fields.contains(field) {
            return Ok(());
        }

        let mut seen = HashSet::new();
        for value in state.documents.iter().filter_map(|doc| doc.get(field)) {
            let key = key_text(value);
            if !seen.insert(key.clone()) {
                return Err(BackendError::DuplicateKey {
                    collection: collection.to_string(),
                    field: field.to_string(),
                    value: key,
                }
                .into());
            }
        }

        state.unique_fields.insert(field.to_string());
        tracing::debug!(collection, field, "Created unique index");
        Ok(())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|state| state.documents.iter().filter(|doc| filter.matches(doc)).count())
            .unwrap_or(0) as u64)
    }

    async fn collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
