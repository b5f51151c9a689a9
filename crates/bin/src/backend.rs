//! Backend creation and utility functions.

use std::path::PathBuf;
use std::sync::Arc;

use userbase::backend::{
    BackendImpl,
    database::{DbKind, InMemory, Postgres, Sqlite, SqlxBackend},
};

use crate::cli::{Backend, BackendConfig};

const SQLITE_FILE: &str = "userbase.db";
const INMEMORY_FILE: &str = "userbase.json";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

/// Path of the JSON snapshot used by the in-memory backend
pub fn inmemory_path(config: &BackendConfig) -> PathBuf {
    config.data_dir().join(INMEMORY_FILE)
}

/// Human-readable description of the configured backend
pub fn backend_label(config: &BackendConfig) -> String {
    match config.backend {
        Backend::Sqlite => format!("sqlite ({})", config.data_dir().join(SQLITE_FILE).display()),
        Backend::Postgres => match &config.postgres_url {
            Some(url) => format!("postgres ({})", redact_postgres_url(url)),
            None => "postgres".to_string(),
        },
        Backend::Inmemory => format!("inmemory ({})", inmemory_path(config).display()),
    }
}

/// Short name of a live backend, as reported by `/health`
pub fn backend_kind(backend: &dyn BackendImpl) -> &'static str {
    if let Some(sqlx) = backend.as_any().downcast_ref::<SqlxBackend>() {
        match sqlx.kind() {
            DbKind::Sqlite => "sqlite",
            DbKind::Postgres => "postgres",
        }
    } else if backend.as_any().is::<InMemory>() {
        "inmemory"
    } else {
        "unknown"
    }
}

/// Create the appropriate backend based on configuration
pub async fn create_backend(
    config: &BackendConfig,
) -> Result<Arc<dyn BackendImpl>, Box<dyn std::error::Error>> {
    let data_dir = config.data_dir();

    match config.backend {
        Backend::Sqlite => {
            tokio::fs::create_dir_all(&data_dir).await?;
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!("Using SQLite backend at {}", db_path.display());
            Ok(Arc::new(Sqlite::open_sqlite(&db_path).await?))
        }
        Backend::Postgres => {
            let url = config
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or USERBASE_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL backend at {}", display_url);

            match Postgres::connect_postgres(url).await {
                Ok(backend) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Arc::new(backend))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {display_url}: {e}").into())
                }
            }
        }
        Backend::Inmemory => {
            tokio::fs::create_dir_all(&data_dir).await?;
            let json_path = inmemory_path(config);
            tracing::info!(
                "Using in-memory backend with persistence at {}",
                json_path.display()
            );
            // A missing file loads as empty; a corrupt one is fatal
            let backend = InMemory::load_from_file(&json_path).await.map_err(|e| {
                format!("Failed to load {}: {e}", json_path.display())
            })?;
            Ok(Arc::new(backend))
        }
    }
}

/// Write the in-memory backend to its snapshot file; no-op for other backends.
pub async fn persist(
    backend: &dyn BackendImpl,
    config: &BackendConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(in_memory) = backend.as_any().downcast_ref::<InMemory>() {
        let json_path = inmemory_path(config);
        in_memory.save_to_file(&json_path).await?;
        tracing::info!("Database saved to {}", json_path.display());
    }
    Ok(())
}

/// Release pooled connections, if any.
pub async fn close(backend: &dyn BackendImpl) {
    if let Some(sqlx) = backend.as_any().downcast_ref::<SqlxBackend>() {
        sqlx.close().await;
    }
}
