//! Backend implementations for Userbase storage
//!
//! This module provides the core `BackendImpl` trait and its implementations.
//!
//! A backend is a document store: JSON objects grouped into named collections,
//! each document keyed by a string `_id`. The user repository only talks to
//! storage through this trait.

use std::any::Any;

use async_trait::async_trait;

use crate::Result;

pub mod database;
mod errors;
mod filter;

pub use errors::BackendError;
pub use filter::Filter;

/// A stored document: a JSON object with a string `_id`.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Document store trait abstracting the underlying storage mechanism.
///
/// All backend implementations must be `Send` and `Sync` to allow sharing across
/// request handlers, and implement `Any` to allow for downcasting if needed.
///
/// ## Uniqueness
///
/// `insert_one` is the only write that creates documents, and it is atomic with
/// respect to the uniqueness checks: the `_id` and every field registered through
/// `create_unique_index` are checked and the document is stored in one step.
/// Two concurrent inserts with the same unique value cannot both succeed.
#[async_trait]
pub trait BackendImpl: Send + Sync + Any {
    /// Returns every document in `collection` matching `filter`.
    ///
    /// A missing collection is treated as empty. Order is unspecified.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    /// Returns the first document in `collection` matching `filter`, if any.
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>>;

    /// Atomically removes and returns one document matching `filter`.
    ///
    /// Returns `Ok(None)` when nothing matched.
    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>>;

    /// Stores a new document.
    ///
    /// # Errors
    /// * `BackendError::MissingId` if the document has no string `_id`
    /// * `BackendError::DuplicateKey` if `_id` or a uniquely indexed field collides
    async fn insert_one(&self, collection: &str, document: Document) -> Result<()>;

    /// Registers `field` as unique within `collection`.
    ///
    /// Idempotent. Fails with `BackendError::DuplicateKey` if stored documents
    /// already violate the constraint. Documents without the field are not
    /// constrained.
    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<()>;

    /// Counts documents in `collection` matching `filter`.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        Ok(self.find(collection, filter).await?.len() as u64)
    }

    /// Names of all collections holding at least one document or index.
    async fn collections(&self) -> Result<Vec<String>>;

    /// Returns a reference to the backend as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Extracts the `_id` of a document about to be written.
pub(crate) fn document_id(collection: &str, document: &Document) -> Result<String> {
    document
        .get(crate::constants::ID_FIELD)
        .and_then(|id| id.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            BackendError::MissingId {
                collection: collection.to_string(),
            }
            .into()
        })
}

/// Canonical text form of a unique-key value, used in error messages and SQL key rows.
pub(crate) fn key_text(value: &serde_json::Value) -> String {
    value.to_string()
}
