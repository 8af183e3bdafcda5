use payloads::requests;
use reqwest::StatusCode;

use test_helpers::{
    alice_credentials, alice_login_credentials, assert_status_code, spawn_app,
};

#[tokio::test]
async fn login_refused() -> anyhow::Result<()> {
    let app = spawn_app().await;

    // test a login with an invalid user
    let body = requests::LoginCredentials {
        username: "random".into(),
        password: "random".into(),
    };
    let result = app.client.login(&body).await;

    match result {
        Err(payloads::ClientError::APIError(code, text)) => {
            assert_eq!(code, StatusCode::UNAUTHORIZED);
            assert_eq!(text, "Authentication failed: Invalid credentials");
        }
        _ => {
            panic!("Expected APIError");
        }
    }

    // login check should fail
    let is_logged_in = app.client.login_check().await?;
    assert!(!is_logged_in);

    Ok(())
}

#[tokio::test]
async fn create_account() -> anyhow::Result<()> {
    let app = spawn_app().await;

    app.create_alice_user().await?;

    // check for valid session
    let is_logged_in = app.client.login_check().await?;
    assert!(is_logged_in);

    let profile = app.client.user_profile().await?;
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.bank_id, None);

    app.client.logout().await?;
    assert!(!app.client.login_check().await?);

    Ok(())
}

#[tokio::test]
async fn duplicate_username_rejected() -> anyhow::Result<()> {
    let app = spawn_app().await;

    app.create_alice_user().await?;
    let result = app.client.create_account(&alice_credentials()).await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn bad_usernames_rejected() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let too_long = "x".repeat(31);
    for username in ["ab", "1alice", "alice smith", too_long.as_str()] {
        let body = requests::CreateAccount {
            username: username.into(),
            password: "a-password".into(),
        };
        let result = app.client.create_account(&body).await;
        assert_status_code(result, StatusCode::BAD_REQUEST);
    }

    Ok(())
}

#[tokio::test]
async fn wrong_password_refused() -> anyhow::Result<()> {
    let app = spawn_app().await;

    app.create_alice_user().await?;
    app.client.logout().await?;

    let body = requests::LoginCredentials {
        username: "alice".into(),
        password: "not-her-password".into(),
    };
    let result = app.client.login(&body).await;
    assert_status_code(result, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn update_password() -> anyhow::Result<()> {
    let app = spawn_app().await;

    app.create_alice_user().await?;
    app.client
        .update_password(&requests::UpdatePassword {
            password: "a-new-password".into(),
        })
        .await?;
    app.client.logout().await?;

    // the old password no longer works
    let result = app.client.login(&alice_login_credentials()).await;
    assert_status_code(result, StatusCode::UNAUTHORIZED);

    app.client
        .login(&requests::LoginCredentials {
            username: "alice".into(),
            password: "a-new-password".into(),
        })
        .await?;
    assert!(app.client.login_check().await?);

    Ok(())
}

#[tokio::test]
async fn profile_requires_authentication() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let result = app.client.user_profile().await;
    assert_status_code(result, StatusCode::UNAUTHORIZED);

    let result = app.client.pending_transactions().await;
    assert_status_code(result, StatusCode::UNAUTHORIZED);

    Ok(())
}
