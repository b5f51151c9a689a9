use std::sync::Arc;

use userbase::user::{UserError, UserForm};

use crate::helpers::{test_authenticator, test_repo};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_signups_for_one_username() {
    let (_, auth, _) = test_authenticator().await;
    let auth = Arc::new(auth);

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let auth = Arc::clone(&auth);
            tokio::spawn(async move {
                auth.sign_up(&UserForm::new("contended", format!("password-{i}")))
                    .await
            })
        })
        .collect();

    let mut winners = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(user) => winners.push(user),
            Err(userbase::Error::User(UserError::UsernameTaken { .. })) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(winners.len(), 1);
    let stored = auth
        .repository()
        .get_by_username("contended")
        .await
        .unwrap();
    assert_eq!(stored, winners[0]);
    assert_eq!(auth.repository().count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_usernames_all_succeed() {
    let (_, repo, _) = test_repo().await;

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.create(&UserForm::new(format!("user{i}"), "pw")).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(repo.list_all().await.unwrap().len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deletes_remove_once() {
    let (_, repo, _) = test_repo().await;
    repo.create(&UserForm::new("target", "pw")).await.unwrap();

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.delete_by_username("target").await })
        })
        .collect();

    let mut deleted = 0;
    for task in tasks {
        if task.await.unwrap().unwrap().is_deleted() {
            deleted += 1;
        }
    }
    assert_eq!(deleted, 1);
}
