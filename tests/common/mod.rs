use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use workforge_hr::create_app;

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    _dir: TempDir,
}

pub async fn spawn_app() -> Result<TestApp> {
    std::env::set_var("JWT_SECRET", "test-secret");

    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    let app = create_app(pool.clone()).await?;

    Ok(TestApp { app, pool, _dir: dir })
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

/// Registers an account through the public signup endpoint and returns its
/// bearer token and user id.
pub async fn register(app: &Router, name: &str, email: &str, role: &str) -> Result<(String, Uuid)> {
    let (status, body) = send(
        app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "password": "password123",
            "role": role,
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "signup failed: {status} {body}");

    let token = body["token"].as_str().context("missing token")?.to_string();
    let id = body["user"]["id"]
        .as_str()
        .context("missing user id")?
        .parse()?;

    Ok((token, id))
}

pub async fn set_manager(
    app: &Router,
    admin_token: &str,
    user_id: Uuid,
    manager_id: Uuid,
) -> Result<()> {
    let (status, body) = send(
        app,
        "PUT",
        &format!("/users/{user_id}"),
        Some(admin_token),
        Some(json!({ "manager_id": manager_id })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "set_manager failed: {status} {body}");
    Ok(())
}

/// Creates an employee profile through the admin endpoint.
pub async fn create_profile(
    app: &Router,
    admin_token: &str,
    user_id: Uuid,
    code: &str,
) -> Result<Uuid> {
    let (status, body) = send(
        app,
        "POST",
        "/employees",
        Some(admin_token),
        Some(json!({
            "user_id": user_id,
            "employee_code": code,
            "date_of_joining": "2025-01-15",
            "base_salary": 6_000_000,
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create_profile failed: {status} {body}");
    Ok(body["id"].as_str().context("missing profile id")?.parse()?)
}
