//! SQL schema definitions and migrations.
//!
//! Documents are stored as JSON text, so the relational schema only has to
//! describe collections, document identity and unique keys. Every statement is
//! portable between SQLite and PostgreSQL.
//!
//! # Migration System
//!
//! Migrations are code, not SQL files, so a step can branch on [`DbKind`](super::DbKind)
//! when the dialects disagree. To add one:
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a `migrate_vN_to_vM` async function
//! 3. Add it to the match in `run_migration`

use super::{SqlxBackend, SqlxResultExt};
use crate::Result;
use crate::backend::BackendError;

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
pub const CREATE_TABLES: &[&str] = &[
    // BIGINT (64-bit) used for portability between SQLite and PostgreSQL
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // One row per document; body is the full JSON object including _id
    "CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        body TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    )",
    // Fields registered through create_unique_index
    "CREATE TABLE IF NOT EXISTS unique_indexes (
        collection TEXT NOT NULL,
        field TEXT NOT NULL,
        PRIMARY KEY (collection, field)
    )",
    // One row per (indexed field, document) pair; the primary key is the constraint
    "CREATE TABLE IF NOT EXISTS unique_keys (
        collection TEXT NOT NULL,
        field TEXT NOT NULL,
        key_value TEXT NOT NULL,
        doc_id TEXT NOT NULL,
        PRIMARY KEY (collection, field, key_value)
    )",
];

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    // Key cleanup on delete
    "CREATE INDEX IF NOT EXISTS idx_unique_keys_doc ON unique_keys(collection, doc_id)",
];

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and runs migrations
/// if the stored schema version is older than [`SCHEMA_VERSION`].
pub async fn initialize(backend: &SqlxBackend) -> Result<()> {
    let pool = backend.pool();

    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Schema creation failed - SQL: {statement}"))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
        }
        Some((current,)) if current < SCHEMA_VERSION => {
            migrate(backend, current, SCHEMA_VERSION).await?;
        }
        Some((current,)) if current > SCHEMA_VERSION => {
            return Err(BackendError::SqlxError {
                reason: format!(
                    "Database schema v{current} is newer than supported v{SCHEMA_VERSION}"
                ),
                source: None,
            }
            .into());
        }
        Some(_) => {}
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Index creation failed - SQL: {statement}"))?;
    }

    Ok(())
}

/// Read the schema version stored in the database.
pub async fn schema_version(backend: &SqlxBackend) -> Result<i64> {
    let (version,): (i64,) = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_one(backend.pool())
        .await
        .sql_context("Failed to read schema version")?;
    Ok(version)
}

/// Run migrations sequentially, bumping the stored version after each step.
async fn migrate(backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        run_migration(backend, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(backend.pool())
            .await
            .sql_context(&format!("Failed to update schema version to {next}"))?;

        tracing::info!(version = next, "Migration completed");
        current = next;
    }

    Ok(())
}

/// Execute a single migration step.
async fn run_migration(backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    // No migrations exist yet; v1 is the first schema.
    let _ = backend;

    Err(BackendError::SqlxError {
        reason: format!("Unknown migration path: v{from} to v{to}"),
        source: None,
    }
    .into())
}
