use userbase::{
    Clock,
    user::{UserError, UserForm},
};

use crate::helpers::test_authenticator;

#[tokio::test]
async fn test_login_returns_session_for_valid_credentials() {
    let (_, auth, clock) = test_authenticator().await;
    let user = auth.sign_up(&UserForm::new("alice", "pw")).await.unwrap();

    let session = auth.login(&UserForm::new("alice", "pw")).await.unwrap();
    assert_eq!(session.user.id, user.id);
    assert_eq!(
        session.expires_at,
        clock.now_secs() + auth.tokens().ttl().as_secs() as i64
    );

    let claims = auth.tokens().verify(&session.token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.iat, clock.now_secs());
}

#[tokio::test]
async fn test_rejections_are_uniform() {
    let (_, auth, _) = test_authenticator().await;
    auth.sign_up(&UserForm::new("alice", "pw")).await.unwrap();

    for form in [
        UserForm::new("nobody", "pw"),
        UserForm::new("alice", "wrong"),
        UserForm::new("ALICE", "pw"),
    ] {
        let err = auth.login(&form).await.unwrap_err();
        assert!(
            matches!(err, userbase::Error::User(UserError::InvalidCredentials)),
            "unexpected error for {form:?}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_login_after_delete_fails() {
    let (_, auth, _) = test_authenticator().await;
    auth.sign_up(&UserForm::new("bob", "pw")).await.unwrap();
    auth.repository().delete_by_username("bob").await.unwrap();

    assert!(
        auth.login(&UserForm::new("bob", "pw"))
            .await
            .unwrap_err()
            .is_authentication_error()
    );
}

#[tokio::test]
async fn test_token_expires_with_clock() {
    let (_, auth, clock) = test_authenticator().await;
    auth.sign_up(&UserForm::new("alice", "pw")).await.unwrap();
    let session = auth.login(&UserForm::new("alice", "pw")).await.unwrap();

    clock.advance(auth.tokens().ttl().as_millis() as u64);
    assert!(auth.tokens().verify(&session.token).is_err());
}

#[tokio::test]
async fn test_empty_credentials_do_not_reach_storage() {
    let (_, auth, _) = test_authenticator().await;
    let err = auth.login(&UserForm::new("", "")).await.unwrap_err();
    assert!(err.is_validation_error());
    assert!(!err.is_authentication_error());
}
