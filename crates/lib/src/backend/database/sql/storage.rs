//! Document reads and writes for SQL backends.
//!
//! Filtering happens in Rust against the decoded JSON body. A filter with a
//! single condition on `_id` or a uniquely indexed field is resolved through
//! the primary key or `unique_keys` first, so lookups by username touch one row.

use sqlx::AnyConnection;

use super::{SqlxBackend, SqlxResultExt};
use crate::Result;
use crate::backend::{BackendError, Document, Filter, document_id, key_text};
use crate::constants::ID_FIELD;

/// Maps a failed write to `DuplicateKey` when the database reports a unique violation.
fn write_error(
    error: sqlx::Error,
    collection: &str,
    field: &str,
    value: String,
    context: &str,
) -> crate::Error {
    if let sqlx::Error::Database(db_err) = &error
        && db_err.is_unique_violation()
    {
        return BackendError::DuplicateKey {
            collection: collection.to_string(),
            field: field.to_string(),
            value,
        }
        .into();
    }
    BackendError::SqlxError {
        reason: format!("{context}: {error}"),
        source: Some(error),
    }
    .into()
}

/// Decodes a stored body, skipping rows that are not JSON objects.
fn decode_body(collection: &str, id: &str, body: &str) -> Option<Document> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(document)) => Some(document),
        Ok(_) => {
            tracing::warn!(collection, id, "Skipping stored document that is not an object");
            None
        }
        Err(e) => {
            tracing::warn!(collection, id, error = %e, "Skipping undecodable stored document");
            None
        }
    }
}

async fn is_unique_field(conn: &mut AnyConnection, collection: &str, field: &str) -> Result<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT field FROM unique_indexes WHERE collection = $1 AND field = $2")
            .bind(collection)
            .bind(field)
            .fetch_optional(&mut *conn)
            .await
            .sql_context("Failed to read unique indexes")?;
    Ok(row.is_some())
}

/// Loads `(id, document)` pairs that match `filter`.
async fn matching(
    conn: &mut AnyConnection,
    collection: &str,
    filter: &Filter,
) -> Result<Vec<(String, Document)>> {
    let indexed = match filter.single() {
        Some((field, _)) if field != ID_FIELD => is_unique_field(conn, collection, field).await?,
        _ => false,
    };

    let rows: Vec<(String, String)> = match filter.single() {
        Some((field, serde_json::Value::String(id))) if field == ID_FIELD => {
            sqlx::query_as("SELECT id, body FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id.as_str())
                .fetch_all(&mut *conn)
                .await
                .sql_context("Failed to read document by id")?
        }
        Some((field, value)) if indexed => {
            sqlx::query_as(
                "SELECT d.id, d.body FROM unique_keys k
                 JOIN documents d ON d.collection = k.collection AND d.id = k.doc_id
                 WHERE k.collection = $1 AND k.field = $2 AND k.key_value = $3",
            )
            .bind(collection)
            .bind(field)
            .bind(key_text(value))
            .fetch_all(&mut *conn)
            .await
            .sql_context("Failed to read document by unique key")?
        }
        _ => sqlx::query_as("SELECT id, body FROM documents WHERE collection = $1 ORDER BY id")
            .bind(collection)
            .fetch_all(&mut *conn)
            .await
            .sql_context("Failed to read documents")?,
    };

    Ok(rows
        .into_iter()
        .filter_map(|(id, body)| decode_body(collection, &id, &body).map(|doc| (id, doc)))
        .filter(|(_, doc)| filter.matches(doc))
        .collect())
}

pub(crate) async fn find(
    backend: &SqlxBackend,
    collection: &str,
    filter: &Filter,
) -> Result<Vec<Document>> {
    let mut conn = backend
        .pool()
        .acquire()
        .await
        .sql_context("Failed to acquire connection")?;
    let found = matching(&mut conn, collection, filter).await?;
    Ok(found.into_iter().map(|(_, doc)| doc).collect())
}

pub(crate) async fn insert_one(
    backend: &SqlxBackend,
    collection: &str,
    document: Document,
) -> Result<()> {
    let id = document_id(collection, &document)?;
    let body =
        serde_json::to_string(&document).map_err(|e| BackendError::SerializationFailed { source: e })?;

    let _write = backend.write_guard().await;
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let fields: Vec<(String,)> =
        sqlx::query_as("SELECT field FROM unique_indexes WHERE collection = $1")
            .bind(collection)
            .fetch_all(&mut *tx)
            .await
            .sql_context("Failed to read unique indexes")?;

    for (field,) in fields {
        let Some(value) = document.get(&field) else {
            continue;
        };
        let key = key_text(value);
        sqlx::query(
            "INSERT INTO unique_keys (collection, field, key_value, doc_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(collection)
        .bind(field.as_str())
        .bind(key.as_str())
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, collection, &field, key.clone(), "Failed to insert unique key"))?;
    }

    sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
        .bind(collection)
        .bind(id.as_str())
        .bind(body)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            write_error(
                e,
                collection,
                ID_FIELD,
                key_text(&serde_json::Value::String(id.clone())),
                "Failed to insert document",
            )
        })?;

    tx.commit().await.sql_context("Failed to commit insert")?;
    Ok(())
}

pub(crate) async fn find_one_and_delete(
    backend: &SqlxBackend,
    collection: &str,
    filter: &Filter,
) -> Result<Option<Document>> {
    let _write = backend.write_guard().await;
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let Some((id, document)) = matching(&mut tx, collection, filter).await?.into_iter().next()
    else {
        return Ok(None);
    };

    let deleted = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
        .bind(collection)
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete document")?;

    // A concurrent delete won the row
    if deleted.rows_affected() == 0 {
        tx.commit().await.sql_context("Failed to commit delete")?;
        return Ok(None);
    }

    sqlx::query("DELETE FROM unique_keys WHERE collection = $1 AND doc_id = $2")
        .bind(collection)
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete unique keys")?;

    tx.commit().await.sql_context("Failed to commit delete")?;
    Ok(Some(document))
}

pub(crate) async fn create_unique_index(
    backend: &SqlxBackend,
    collection: &str,
    field: &str,
) -> Result<()> {
    let _write = backend.write_guard().await;
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    if is_unique_field(&mut tx, collection, field).await? {
        tx.commit().await.sql_context("Failed to commit index check")?;
        return Ok(());
    }

    sqlx::query("INSERT INTO unique_indexes (collection, field) VALUES ($1, $2)")
        .bind(collection)
        .bind(field)
        .execute(&mut *tx)
        .await
        .sql_context("Failed to register unique index")?;

    // Backfill keys for documents stored before the index existed
    let existing = matching(&mut tx, collection, &Filter::all()).await?;
    for (id, document) in existing {
        let Some(value) = document.get(field) else {
            continue;
        };
        let key = key_text(value);
        sqlx::query(
            "INSERT INTO unique_keys (collection, field, key_value, doc_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(collection)
        .bind(field)
        .bind(key.as_str())
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, collection, field, key.clone(), "Failed to backfill unique key"))?;
    }

    tx.commit().await.sql_context("Failed to commit unique index")?;
    tracing::debug!(collection, field, "Created unique index");
    Ok(())
}

pub(crate) async fn count(backend: &SqlxBackend, collection: &str, filter: &Filter) -> Result<u64> {
    if !filter.is_empty() {
        return Ok(find(backend, collection, filter).await?.len() as u64);
    }
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = $1")
        .bind(collection)
        .fetch_one(backend.pool())
        .await
        .sql_context("Failed to count documents")?;
    Ok(count.max(0) as u64)
}

pub(crate) async fn collections(backend: &SqlxBackend) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT collection FROM documents
         UNION
         SELECT collection FROM unique_indexes
         ORDER BY collection",
    )
    .fetch_all(backend.pool())
    .await
    .sql_context("Failed to list collections")?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
