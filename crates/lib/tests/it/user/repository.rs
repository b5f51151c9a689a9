use serde_json::json;
use userbase::{
    Clock,
    backend::Filter,
    user::{Deletion, Role, UserError, UserForm, verify_password},
};

use crate::helpers::{doc, test_repo};

#[tokio::test]
async fn test_create_then_fetch() {
    let (_, repo, clock) = test_repo().await;
    let created = repo.create(&UserForm::new("alice", "s3cret")).await.unwrap();

    let fetched = repo.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.username, "alice");
    assert_eq!(fetched.created_at, clock.now_secs());
    assert_ne!(fetched.password_hash, "s3cret");
    assert!(verify_password("s3cret", &fetched.password_hash).unwrap());
}

#[tokio::test]
async fn test_usernames_are_case_sensitive() {
    let (_, repo, _) = test_repo().await;
    repo.create(&UserForm::new("alice", "pw")).await.unwrap();
    repo.create(&UserForm::new("Alice", "pw")).await.unwrap();

    assert!(repo.find_by_username("ALICE").await.unwrap().is_none());
    assert_eq!(repo.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_signup_creates_no_second_record() {
    let (_, repo, _) = test_repo().await;
    let original = repo.create(&UserForm::new("alice", "first")).await.unwrap();

    let err = repo
        .create(&UserForm::new("alice", "second"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        userbase::Error::User(UserError::UsernameTaken { ref username }) if username == "alice"
    ));

    let all = repo.list_all().await.unwrap();
    assert_eq!(all, vec![original]);
}

#[tokio::test]
async fn test_list_returns_every_created_user() {
    let (_, repo, _) = test_repo().await;
    assert!(repo.list_all().await.unwrap().is_empty());

    for i in 0..5 {
        repo.create(&UserForm::new(format!("user{i}"), "pw"))
            .await
            .unwrap();
    }

    let mut names: Vec<String> = repo
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    names.sort();
    assert_eq!(names, vec!["user0", "user1", "user2", "user3", "user4"]);
}

#[tokio::test]
async fn test_list_skips_undecodable_records() {
    let (backend, repo, _) = test_repo().await;
    repo.create(&UserForm::new("alice", "pw")).await.unwrap();
    // A record missing its hash cannot become a User
    backend
        .insert_one("user", doc(json!({"_id": "broken", "username": "mallory"})))
        .await
        .unwrap();

    let users = repo.list_all().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "alice");
}

#[tokio::test]
async fn test_delete_removes_undecodable_record() {
    let (backend, repo, _) = test_repo().await;
    backend
        .insert_one("user", doc(json!({"_id": "broken", "username": "mallory"})))
        .await
        .unwrap();

    let outcome = repo.delete_by_username("mallory").await.unwrap();
    assert_eq!(
        outcome,
        Deletion::DeletedUnreadable {
            id: "broken".to_string()
        }
    );
    assert!(outcome.is_deleted());
    assert_eq!(backend.count("user", &Filter::all()).await.unwrap(), 0);
    assert_eq!(
        repo.delete_by_username("mallory").await.unwrap(),
        Deletion::NotFound
    );
}

#[tokio::test]
async fn test_delete_then_fetch() {
    let (_, repo, _) = test_repo().await;
    let created = repo.create(&UserForm::new("bob", "pw")).await.unwrap();
    repo.create(&UserForm::new("carol", "pw")).await.unwrap();

    assert_eq!(
        repo.delete_by_username("bob").await.unwrap(),
        Deletion::Deleted(created)
    );
    assert!(repo.find_by_username("bob").await.unwrap().is_none());
    assert!(!repo.delete_by_username("bob").await.unwrap().is_deleted());

    // Only the named user was removed
    assert!(repo.find_by_username("carol").await.unwrap().is_some());
}

#[tokio::test]
async fn test_roles_are_stored() {
    let (_, repo, _) = test_repo().await;
    let admin = repo
        .create_with_role(&UserForm::new("root", "pw"), Role::Admin)
        .await
        .unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(
        repo.get_by_username("root").await.unwrap().role,
        Role::Admin
    );
}

#[tokio::test]
async fn test_get_missing_user_is_not_found() {
    let (_, repo, _) = test_repo().await;
    let err = repo.get_by_username("nobody").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "User not found: nobody");
}
