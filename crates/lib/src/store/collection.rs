//! Collection handle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::StoreError;
use crate::Result;
use crate::backend::{BackendImpl, Document, Filter};
use crate::constants::DEFAULT_OPERATION_TIMEOUT;

/// A named collection in a backend, with a deadline applied to every call.
///
/// Cloning is cheap; clones share the backend.
#[derive(Clone)]
pub struct Collection {
    backend: Arc<dyn BackendImpl>,
    name: String,
    timeout: Duration,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Collection {
    /// Bind `name` in `backend` with the default operation timeout.
    pub fn new(backend: Arc<dyn BackendImpl>, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
            timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Replace the per-operation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    collection = %self.name,
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Backend operation timed out"
                );
                Err(StoreError::Timeout {
                    collection: self.name.clone(),
                    operation,
                    timeout: self.timeout,
                }
                .into())
            }
        }
    }

    /// Decode a raw document from this collection.
    pub fn decode<T: DeserializeOwned>(&self, document: Document) -> Result<T> {
        serde_json::from_value(serde_json::Value::Object(document)).map_err(|e| {
            StoreError::DeserializationFailed {
                collection: self.name.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn encode<T: Serialize>(&self, record: &T) -> Result<Document> {
        let value = serde_json::to_value(record).map_err(|e| StoreError::SerializationFailed {
            collection: self.name.clone(),
            reason: e.to_string(),
        })?;
        match value {
            serde_json::Value::Object(document) => Ok(document),
            _ => Err(StoreError::NotADocument {
                collection: self.name.clone(),
            }
            .into()),
        }
    }

    /// Every record matching `filter`.
    ///
    /// Documents that fail to decode are logged and skipped, so one bad
    /// record does not hide the rest.
    pub async fn find_all<T: DeserializeOwned>(&self, filter: &Filter) -> Result<Vec<T>> {
        let documents = self
            .bounded("find", self.backend.find(&self.name, filter))
            .await?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            let id = document
                .get(crate::constants::ID_FIELD)
                .and_then(|v| v.as_str())
                .unwrap_or("<none>")
                .to_string();
            match self.decode(document) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(collection = %self.name, id = %id, error = %e, "Skipping undecodable document");
                }
            }
        }
        Ok(records)
    }

    /// The first record matching `filter`.
    pub async fn find_one<T: DeserializeOwned>(&self, filter: &Filter) -> Result<Option<T>> {
        self.bounded("find_one", self.backend.find_one(&self.name, filter))
            .await?
            .map(|document| self.decode(document))
            .transpose()
    }

    /// Store `record` as a new document.
    ///
    /// The record must serialize to a JSON object with a string `_id`.
    pub async fn insert_one<T: Serialize>(&self, record: &T) -> Result<()> {
        let document = self.encode(record)?;
        self.bounded("insert_one", self.backend.insert_one(&self.name, document))
            .await
    }

    /// Remove one document matching `filter` and return it undecoded.
    ///
    /// The removal is committed before the caller sees the document, so
    /// decoding is left to [`Collection::decode`].
    pub async fn find_one_and_delete(&self, filter: &Filter) -> Result<Option<Document>> {
        self.bounded(
            "find_one_and_delete",
            self.backend.find_one_and_delete(&self.name, filter),
        )
        .await
    }

    pub async fn create_unique_index(&self, field: &str) -> Result<()> {
        self.bounded(
            "create_unique_index",
            self.backend.create_unique_index(&self.name, field),
        )
        .await
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64> {
        self.bounded("count", self.backend.count(&self.name, filter))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::backend::database::InMemory;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(rename = "_id")]
        id: String,
        text: String,
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    /// Delays every read so deadlines can be exercised.
    struct Sluggish {
        inner: InMemory,
        delay: Duration,
    }

    #[async_trait]
    impl BackendImpl for Sluggish {
        async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
            tokio::time::sleep(self.delay).await;
            self.inner.find(collection, filter).await
        }
        async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
            tokio::time::sleep(self.delay).await;
            self.inner.find_one(collection, filter).await
        }
        async fn find_one_and_delete(
            &self,
            collection: &str,
            filter: &Filter,
        ) -> Result<Option<Document>> {
            self.inner.find_one_and_delete(collection, filter).await
        }
        async fn insert_one(&self, collection: &str, document: Document) -> Result<()> {
            self.inner.insert_one(collection, document).await
        }
        async fn create_unique_index(&self, collection: &str, field: &str) -> Result<()> {
            self.inner.create_unique_index(collection, field).await
        }
        async fn collections(&self) -> Result<Vec<String>> {
            self.inner.collections().await
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[tokio::test]
    async fn typed_round_trip() {
        let notes = Collection::new(Arc::new(InMemory::new()), "notes");
        notes.insert_one(&note("1", "hello")).await.unwrap();
        notes.insert_one(&note("2", "world")).await.unwrap();

        let found: Option<Note> = notes.find_one(&Filter::eq("text", "world")).await.unwrap();
        assert_eq!(found, Some(note("2", "world")));

        let all: Vec<Note> = notes.find_all(&Filter::all()).await.unwrap();
        assert_eq!(all.len(), 2);

        let removed = notes
            .find_one_and_delete(&Filter::eq("_id", "1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notes.decode::<Note>(removed).unwrap(), note("1", "hello"));
        assert_eq!(notes.count(&Filter::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_all_skips_undecodable_documents() {
        let backend = Arc::new(InMemory::new());
        backend
            .insert_one("notes", json!({"_id": "bad", "text": 42}).as_object().cloned().unwrap())
            .await
            .unwrap();
        let notes = Collection::new(backend, "notes");
        notes.insert_one(&note("good", "fine")).await.unwrap();

        let all: Vec<Note> = notes.find_all(&Filter::all()).await.unwrap();
        assert_eq!(all, vec![note("good", "fine")]);

        // A single lookup reports the failure instead
        let err = notes
            .find_one::<Note>(&Filter::eq("_id", "bad"))
            .await
            .unwrap_err();
        assert!(err.is_serialization_error());
    }

    #[tokio::test]
    async fn non_object_records_are_rejected() {
        let notes = Collection::new(Arc::new(InMemory::new()), "notes");
        let err = notes.insert_one(&"just a string").await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Store(StoreError::NotADocument { .. })
        ));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let backend = Arc::new(Sluggish {
            inner: InMemory::new(),
            delay: Duration::from_millis(500),
        });
        let notes = Collection::new(backend, "notes").with_timeout(Duration::from_millis(20));

        let err = notes.find_all::<Note>(&Filter::all()).await.unwrap_err();
        assert!(err.is_timeout());
        match err {
            crate::Error::Store(store_err) => assert_eq!(store_err.collection(), "notes"),
            other => panic!("Unexpected error: {other:?}"),
        }

        // Writes are not delayed and still succeed
        notes.insert_one(&note("1", "quick")).await.unwrap();
    }
}
