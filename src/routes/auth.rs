use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Actor, Role};
use crate::errors::{AppError, AppResult};
use crate::models::user::{AuthResponse, DbUser, LoginRequest, RegisterRequest, User};
use crate::utils::{hash_password, utc_now, verify_password};

pub(crate) const USER_SELECT: &str = "SELECT u.id, u.name, u.email, u.password_hash, u.role, \
     u.manager_id, m.name AS manager_name, u.created_at, u.updated_at \
     FROM users u LEFT JOIN users m ON m.id = u.manager_id";

#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("a valid email is required"));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name is required"));
    }

    let password_hash = hash_password(&payload.password)?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(&email)
        .fetch_one(&state.pool)
        .await?;
    if exists {
        return Err(AppError::conflict("email already registered"));
    }

    let id = Uuid::new_v4();
    let role = payload.role.unwrap_or(Role::User);
    let now = utc_now();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, manager_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, NULL, ?, ?)",
    )
    .bind(id)
    .bind(payload.name.trim())
    .bind(&email)
    .bind(&password_hash)
    .bind(role)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let user = fetch_user(&state.pool, id).await?;
    let token = state.jwt.encode(id)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { token, user: user.into() }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = payload.email.trim().to_lowercase();
    let sql = format!("{USER_SELECT} WHERE u.email = ?");
    let user = sqlx::query_as::<_, DbUser>(&sql)
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid email or password"))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::unauthorized("invalid email or password"));
    }

    let token = state.jwt.encode(user.id)?;

    Ok(Json(AuthResponse { token, user: user.into() }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Current user", body = User)),
    security(("bearer_auth" = []))
)]
pub async fn me(State(state): State<AppState>, actor: Actor) -> AppResult<Json<User>> {
    let user = fetch_user(&state.pool, actor.id).await?;
    Ok(Json(user.into()))
}

pub(crate) async fn fetch_user(pool: &SqlitePool, id: Uuid) -> AppResult<DbUser> {
    let sql = format!("{USER_SELECT} WHERE u.id = ?");
    sqlx::query_as::<_, DbUser>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))
}
