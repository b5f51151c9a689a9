use std::sync::Arc;

use userbase::{
    FixedClock,
    backend::{BackendImpl, Document, database::InMemory},
    constants::DEFAULT_OPERATION_TIMEOUT,
    user::{Authenticator, TokenIssuer, UserRepository},
};

// ==========================
// CORE TEST FACTORIES
// ==========================
// A single point of change for backend matrix testing via TEST_BACKEND env var.

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
/// - "postgres": PostgreSQL backend in an isolated schema (requires `postgres`
///   feature and TEST_POSTGRES_URL)
///
/// # Example
/// ```bash
/// # Run tests with InMemory (default)
/// cargo test
///
/// # Run tests with SQLite
/// TEST_BACKEND=sqlite cargo test
/// ```
pub async fn test_backend() -> Arc<dyn BackendImpl> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use userbase::backend::database::Sqlite;
                Arc::new(
                    Sqlite::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite backend"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use userbase::backend::database::Postgres;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/userbase_test".to_string());
                Arc::new(
                    Postgres::connect_postgres_isolated(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => Arc::new(InMemory::new()),
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite, postgres")
        }
    }
}

/// Repository over a fresh test backend with a [`FixedClock`].
pub async fn test_repo() -> (Arc<dyn BackendImpl>, Arc<UserRepository>, Arc<FixedClock>) {
    let backend = test_backend().await;
    let clock = Arc::new(FixedClock::default());
    let repo = UserRepository::new(backend.clone(), DEFAULT_OPERATION_TIMEOUT)
        .await
        .expect("Failed to create repository")
        .with_clock(clock.clone());
    (backend, Arc::new(repo), clock)
}

/// Authenticator over a fresh test backend, sharing one clock with its token issuer.
pub async fn test_authenticator() -> (Arc<dyn BackendImpl>, Authenticator, Arc<FixedClock>) {
    let (backend, repo, clock) = test_repo().await;
    let tokens = TokenIssuer::new("integration-secret").with_clock(clock.clone());
    (backend, Authenticator::new(repo, Arc::new(tokens)), clock)
}

/// Builds a document from a `json!` object literal.
pub fn doc(value: serde_json::Value) -> Document {
    value
        .as_object()
        .cloned()
        .expect("Test document must be a JSON object")
}
