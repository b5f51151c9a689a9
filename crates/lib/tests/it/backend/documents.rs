use std::sync::Arc;

use serde_json::json;
use userbase::backend::{BackendError, Filter};

use crate::helpers::{doc, test_backend};

#[tokio::test]
async fn test_insert_and_find_by_field() {
    let backend = test_backend().await;
    backend
        .insert_one("user", doc(json!({"_id": "1", "username": "alice", "n": 1})))
        .await
        .unwrap();
    backend
        .insert_one("user", doc(json!({"_id": "2", "username": "bob", "n": 2})))
        .await
        .unwrap();

    let found = backend
        .find("user", &Filter::eq("n", 2))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["username"], "bob");

    // JSON equality: a string never matches a number
    assert!(backend.find("user", &Filter::eq("n", "2")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_conjunctive_filter() {
    let backend = test_backend().await;
    for (id, name, team) in [("1", "alice", "red"), ("2", "bob", "red"), ("3", "carol", "blue")] {
        backend
            .insert_one("user", doc(json!({"_id": id, "username": name, "team": team})))
            .await
            .unwrap();
    }

    let filter = Filter::eq("team", "red").and_eq("username", "bob");
    let found = backend.find("user", &filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["_id"], "2");
    assert_eq!(backend.count("user", &Filter::eq("team", "red")).await.unwrap(), 2);
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let backend = test_backend().await;
    backend
        .insert_one("user", doc(json!({"_id": "1", "username": "alice"})))
        .await
        .unwrap();
    // Same _id in another collection is not a collision
    backend
        .insert_one("audit", doc(json!({"_id": "1", "event": "signup"})))
        .await
        .unwrap();

    assert_eq!(backend.count("user", &Filter::all()).await.unwrap(), 1);
    assert_eq!(backend.count("audit", &Filter::all()).await.unwrap(), 1);
    assert_eq!(
        backend.collections().await.unwrap(),
        vec!["audit".to_string(), "user".to_string()]
    );
}

#[tokio::test]
async fn test_unique_index_constraint() {
    let backend = test_backend().await;
    backend.create_unique_index("user", "username").await.unwrap();
    backend.create_unique_index("user", "username").await.unwrap();

    backend
        .insert_one("user", doc(json!({"_id": "1", "username": "alice"})))
        .await
        .unwrap();
    let err = backend
        .insert_one("user", doc(json!({"_id": "2", "username": "alice"})))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // Documents without the field are unconstrained
    backend
        .insert_one("user", doc(json!({"_id": "3"})))
        .await
        .unwrap();
    backend
        .insert_one("user", doc(json!({"_id": "4"})))
        .await
        .unwrap();
    assert_eq!(backend.count("user", &Filter::all()).await.unwrap(), 3);
}

#[tokio::test]
async fn test_duplicate_id_reported_on_id_field() {
    let backend = test_backend().await;
    backend
        .insert_one("user", doc(json!({"_id": "1", "username": "alice"})))
        .await
        .unwrap();
    let err = backend
        .insert_one("user", doc(json!({"_id": "1", "username": "bob"})))
        .await
        .unwrap_err();
    match err {
        userbase::Error::Backend(e) => assert_eq!(e.duplicate_field(), Some("_id")),
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_index_over_conflicting_data_fails() {
    let backend = test_backend().await;
    backend
        .insert_one("user", doc(json!({"_id": "1", "username": "alice"})))
        .await
        .unwrap();
    backend
        .insert_one("user", doc(json!({"_id": "2", "username": "alice"})))
        .await
        .unwrap();

    let err = backend
        .create_unique_index("user", "username")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        userbase::Error::Backend(BackendError::DuplicateKey { .. })
    ));

    // The failed index is not half-registered
    backend
        .insert_one("user", doc(json!({"_id": "3", "username": "alice"})))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_find_one_and_delete() {
    let backend = test_backend().await;
    backend.create_unique_index("user", "username").await.unwrap();
    backend
        .insert_one("user", doc(json!({"_id": "1", "username": "alice"})))
        .await
        .unwrap();

    let removed = backend
        .find_one_and_delete("user", &Filter::eq("username", "alice"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(removed["_id"], "1");
    assert!(
        backend
            .find_one("user", &Filter::eq("username", "alice"))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        backend
            .find_one_and_delete("user", &Filter::eq("username", "alice"))
            .await
            .unwrap()
            .is_none()
    );

    // The username is free again
    backend
        .insert_one("user", doc(json!({"_id": "2", "username": "alice"})))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_unique_inserts() {
    let backend = test_backend().await;
    backend.create_unique_index("user", "username").await.unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move {
                backend
                    .insert_one(
                        "user",
                        doc(json!({"_id": format!("id-{i}"), "username": "contended"})),
                    )
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => successes += 1,
            Err(e) => assert!(e.is_conflict(), "unexpected error: {e:?}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(backend.count("user", &Filter::all()).await.unwrap(), 1);
}
