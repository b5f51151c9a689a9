use std::sync::Arc;

use serde_json::json;
use userbase::{
    backend::{BackendImpl, Filter, database::InMemory},
    constants::DEFAULT_OPERATION_TIMEOUT,
    user::{UserForm, UserRepository},
};

use crate::helpers::doc;

#[tokio::test]
async fn test_inmemory_users_survive_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("userbase.json");

    let backend = Arc::new(InMemory::new());
    let repo = UserRepository::new(backend.clone(), DEFAULT_OPERATION_TIMEOUT)
        .await
        .unwrap();
    let alice = repo.create(&UserForm::new("alice", "pw")).await.unwrap();
    backend.save_to_file(&path).await.unwrap();

    let reloaded = Arc::new(InMemory::load_from_file(&path).await.unwrap());
    let repo = UserRepository::new(reloaded, DEFAULT_OPERATION_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(repo.get_by_username("alice").await.unwrap(), alice);

    // The username index came back with the data
    let err = repo
        .create(&UserForm::new("alice", "again"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_inmemory_save_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("userbase.json");

    let backend = InMemory::new();
    backend
        .insert_one("user", doc(json!({"_id": "1"})))
        .await
        .unwrap();
    backend.save_to_file(&path).await.unwrap();
    backend
        .find_one_and_delete("user", &Filter::all())
        .await
        .unwrap();
    backend.save_to_file(&path).await.unwrap();

    let reloaded = InMemory::load_from_file(&path).await.unwrap();
    assert_eq!(reloaded.count("user", &Filter::all()).await.unwrap(), 0);
    assert!(!path.with_extension("tmp").exists());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_file_reopens_with_data() {
    use userbase::backend::database::Sqlite;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("userbase.db");

    {
        let backend = Arc::new(Sqlite::open_sqlite(&path).await.unwrap());
        let repo = UserRepository::new(backend.clone(), DEFAULT_OPERATION_TIMEOUT)
            .await
            .unwrap();
        repo.create(&UserForm::new("alice", "pw")).await.unwrap();
        backend.close().await;
    }

    let backend = Arc::new(Sqlite::open_sqlite(&path).await.unwrap());
    let repo = UserRepository::new(backend.clone(), DEFAULT_OPERATION_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(repo.count().await.unwrap(), 1);
    assert!(
        repo.create(&UserForm::new("alice", "pw"))
            .await
            .unwrap_err()
            .is_conflict()
    );
    backend.close().await;
}
