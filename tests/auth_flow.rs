mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{register, send, spawn_app};

#[tokio::test]
async fn signup_login_me_roundtrip() -> Result<()> {
    let test = spawn_app().await?;

    let (token, id) = register(&test.app, "Priya Sharma", "priya@example.com", "user").await?;

    let (status, body) = send(&test.app, "GET", "/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_str().unwrap(), id.to_string());
    assert_eq!(body["email"], "priya@example.com");
    assert_eq!(body["role"], "user");

    let (status, body) = send(
        &test.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "priya@example.com", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_password() -> Result<()> {
    let test = spawn_app().await?;
    register(&test.app, "Priya Sharma", "priya@example.com", "user").await?;

    let (status, _) = send(
        &test.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "priya@example.com", "password": "wrong-password" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn signup_rejects_duplicate_email_and_short_password() -> Result<()> {
    let test = spawn_app().await?;
    register(&test.app, "Priya Sharma", "priya@example.com", "user").await?;

    let (status, _) = send(
        &test.app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "name": "Other", "email": "priya@example.com", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &test.app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "name": "Short", "email": "short@example.com", "password": "tiny" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let test = spawn_app().await?;

    let (status, _) = send(&test.app, "GET", "/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&test.app, "GET", "/tasks", Some("not-a-token"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
