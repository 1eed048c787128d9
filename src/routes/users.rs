use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{list_scope, require, Actor, Operation, Resource, Role, Scope};
use crate::errors::{AppError, AppResult};
use crate::models::user::{
    DbUser, ResetPasswordRequest, User, UserCreateRequest, UserUpdateRequest,
};
use crate::routes::auth::{fetch_user, USER_SELECT};
use crate::utils::{hash_password, utc_now};

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses((status = 200, description = "Visible users", body = [User])),
    security(("bearer_auth" = []))
)]
pub async fn list_users(State(state): State<AppState>, actor: Actor) -> AppResult<Json<Vec<User>>> {
    let scope = list_scope(&actor, Resource::User)?;

    let rows = match scope {
        Scope::All => {
            let sql = format!("{USER_SELECT} ORDER BY u.created_at DESC");
            sqlx::query_as::<_, DbUser>(&sql).fetch_all(&state.pool).await?
        }
        Scope::Team(manager_id) => {
            let sql = format!("{USER_SELECT} WHERE u.manager_id = ? ORDER BY u.created_at DESC");
            sqlx::query_as::<_, DbUser>(&sql)
                .bind(manager_id)
                .fetch_all(&state.pool)
                .await?
        }
        Scope::Own(user_id) => {
            let sql = format!("{USER_SELECT} WHERE u.id = ?");
            sqlx::query_as::<_, DbUser>(&sql)
                .bind(user_id)
                .fetch_all(&state.pool)
                .await?
        }
    };

    Ok(Json(rows.into_iter().map(User::from).collect()))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<UserCreateRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    require(&actor, Resource::User, Operation::Create, None)?;

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("a valid email is required"));
    }
    let password_hash = hash_password(&payload.password)?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(&email)
        .fetch_one(&state.pool)
        .await?;
    if exists {
        return Err(AppError::conflict("email already registered"));
    }

    if let Some(manager_id) = payload.manager_id {
        ensure_manager(&state.pool, manager_id).await?;
    }

    let id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, manager_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(payload.name.trim())
    .bind(&email)
    .bind(&password_hash)
    .bind(payload.role.unwrap_or(Role::User))
    .bind(payload.manager_id)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let user = fetch_user(&state.pool, id).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "User detail", body = User)),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    require(&actor, Resource::User, Operation::Read, None)?;
    let user = fetch_user(&state.pool, id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses((status = 200, description = "User updated", body = User)),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    require(&actor, Resource::User, Operation::UpdateFull, None)?;

    let current = fetch_user(&state.pool, id).await?;

    let name = payload.name.unwrap_or(current.name);
    let email = match payload.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            if email != current.email {
                let taken: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND id != ?)")
                        .bind(&email)
                        .bind(id)
                        .fetch_one(&state.pool)
                        .await?;
                if taken {
                    return Err(AppError::conflict("email already registered"));
                }
            }
            email
        }
        None => current.email,
    };
    let password_hash = match payload.password {
        Some(password) => hash_password(&password)?,
        None => current.password_hash,
    };
    let role = payload.role.unwrap_or(current.role);
    let manager_id = match payload.manager_id {
        Some(manager_id) => {
            if let Some(manager_id) = manager_id {
                ensure_manager(&state.pool, manager_id).await?;
            }
            manager_id
        }
        None => current.manager_id,
    };

    sqlx::query(
        "UPDATE users SET name = ?, email = ?, password_hash = ?, role = ?, manager_id = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(role)
    .bind(manager_id)
    .bind(utc_now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    let user = fetch_user(&state.pool, id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 204, description = "User deleted")),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require(&actor, Resource::User, Operation::Delete, None)?;

    if id == actor.id {
        return Err(AppError::bad_request("cannot delete your own account"));
    }

    let affected = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/users/{id}/reset-password",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = ResetPasswordRequest,
    responses((status = 204, description = "Password reset")),
    security(("bearer_auth" = []))
)]
pub async fn reset_password(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    require(&actor, Resource::User, Operation::UpdateFull, None)?;

    let password_hash = hash_password(&payload.new_password)?;
    let affected = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(utc_now())
        .bind(id)
        .execute(&state.pool)
        .await?;
    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn ensure_manager(pool: &SqlitePool, manager_id: Uuid) -> AppResult<()> {
    let role: Option<Role> = sqlx::query_scalar("SELECT role FROM users WHERE id = ?")
        .bind(manager_id)
        .fetch_optional(pool)
        .await?;

    match role {
        Some(Role::Manager) => Ok(()),
        Some(_) => Err(AppError::bad_request("manager_id must reference a manager-role user")),
        None => Err(AppError::bad_request("manager_id does not exist")),
    }
}
