use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{list_scope, require, Actor, Operation, Ownership, Resource, Scope};
use crate::errors::{AppError, AppResult};
use crate::models::team::{DbTeam, Team, TeamCreateRequest, TeamUpdateRequest};
use crate::routes::users::ensure_manager;
use crate::utils::utc_now;

const TEAM_SELECT: &str = "SELECT t.id, t.name, t.description, t.manager_id, \
     m.name AS manager_name, \
     (SELECT COUNT(*) FROM employee_profiles ep WHERE ep.team_id = t.id) AS member_count, \
     t.created_at, t.updated_at \
     FROM teams t LEFT JOIN users m ON m.id = t.manager_id";

#[utoipa::path(
    get,
    path = "/teams",
    tag = "Teams",
    responses((status = 200, description = "Visible teams", body = [Team])),
    security(("bearer_auth" = []))
)]
pub async fn list_teams(State(state): State<AppState>, actor: Actor) -> AppResult<Json<Vec<Team>>> {
    let scope = list_scope(&actor, Resource::Team)?;

    let rows = match scope {
        Scope::All => {
            let sql = format!("{TEAM_SELECT} ORDER BY t.name ASC");
            sqlx::query_as::<_, DbTeam>(&sql).fetch_all(&state.pool).await?
        }
        Scope::Team(manager_id) => {
            let sql = format!("{TEAM_SELECT} WHERE t.manager_id = ? ORDER BY t.name ASC");
            sqlx::query_as::<_, DbTeam>(&sql)
                .bind(manager_id)
                .fetch_all(&state.pool)
                .await?
        }
        // Plain users are denied above; nothing is own-scoped for teams.
        Scope::Own(_) => Vec::new(),
    };

    Ok(Json(rows.into_iter().map(Team::from).collect()))
}

#[utoipa::path(
    post,
    path = "/teams",
    tag = "Teams",
    request_body = TeamCreateRequest,
    responses((status = 201, description = "Team created", body = Team)),
    security(("bearer_auth" = []))
)]
pub async fn create_team(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<TeamCreateRequest>,
) -> AppResult<(StatusCode, Json<Team>)> {
    require(&actor, Resource::Team, Operation::Create, None)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("team name is required"));
    }
    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE name = ?)")
        .bind(name)
        .fetch_one(&state.pool)
        .await?;
    if taken {
        return Err(AppError::conflict("team name already in use"));
    }
    if let Some(manager_id) = payload.manager_id {
        ensure_manager(&state.pool, manager_id).await?;
    }

    let id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO teams (id, name, description, manager_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(&payload.description)
    .bind(payload.manager_id)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let team = fetch_team(&state.pool, &Scope::All, id).await?;
    Ok((StatusCode::CREATED, Json(team.into())))
}

#[utoipa::path(
    get,
    path = "/teams/{id}",
    tag = "Teams",
    params(("id" = Uuid, Path, description = "Team id")),
    responses((status = 200, description = "Team detail", body = Team)),
    security(("bearer_auth" = []))
)]
pub async fn get_team(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Team>> {
    let scope = list_scope(&actor, Resource::Team)?;
    let team = fetch_team(&state.pool, &scope, id).await?;
    Ok(Json(team.into()))
}

#[utoipa::path(
    put,
    path = "/teams/{id}",
    tag = "Teams",
    params(("id" = Uuid, Path, description = "Team id")),
    request_body = TeamUpdateRequest,
    responses((status = 200, description = "Team updated", body = Team)),
    security(("bearer_auth" = []))
)]
pub async fn update_team(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<TeamUpdateRequest>,
) -> AppResult<Json<Team>> {
    let scope = list_scope(&actor, Resource::Team)?;
    let current = fetch_team(&state.pool, &scope, id).await?;
    require(
        &actor,
        Resource::Team,
        Operation::UpdateFull,
        Some(&Ownership::team(current.manager_id)),
    )?;

    let name = match payload.name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::bad_request("team name is required"));
            }
            if name != current.name {
                let taken: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE name = ? AND id != ?)")
                        .bind(&name)
                        .bind(id)
                        .fetch_one(&state.pool)
                        .await?;
                if taken {
                    return Err(AppError::conflict("team name already in use"));
                }
            }
            name
        }
        None => current.name,
    };
    let description = payload.description.or(current.description);
    let manager_id = match payload.manager_id {
        Some(manager_id) => {
            if let Some(manager_id) = manager_id {
                ensure_manager(&state.pool, manager_id).await?;
            }
            manager_id
        }
        None => current.manager_id,
    };

    sqlx::query("UPDATE teams SET name = ?, description = ?, manager_id = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&description)
        .bind(manager_id)
        .bind(utc_now())
        .bind(id)
        .execute(&state.pool)
        .await?;

    let team = fetch_team(&state.pool, &Scope::All, id).await?;
    Ok(Json(team.into()))
}

#[utoipa::path(
    delete,
    path = "/teams/{id}",
    tag = "Teams",
    params(("id" = Uuid, Path, description = "Team id")),
    responses((status = 204, description = "Team deleted")),
    security(("bearer_auth" = []))
)]
pub async fn delete_team(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let scope = list_scope(&actor, Resource::Team)?;
    let current = fetch_team(&state.pool, &scope, id).await?;
    require(
        &actor,
        Resource::Team,
        Operation::Delete,
        Some(&Ownership::team(current.manager_id)),
    )?;

    sqlx::query("DELETE FROM teams WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Scope-filtered detail fetch: records outside the caller's visibility
/// surface as a plain 404.
async fn fetch_team(pool: &SqlitePool, scope: &Scope, id: Uuid) -> AppResult<DbTeam> {
    let row = match scope {
        Scope::All => {
            let sql = format!("{TEAM_SELECT} WHERE t.id = ?");
            sqlx::query_as::<_, DbTeam>(&sql).bind(id).fetch_optional(pool).await?
        }
        Scope::Team(manager_id) => {
            let sql = format!("{TEAM_SELECT} WHERE t.id = ? AND t.manager_id = ?");
            sqlx::query_as::<_, DbTeam>(&sql)
                .bind(id)
                .bind(manager_id)
                .fetch_optional(pool)
                .await?
        }
        Scope::Own(_) => None,
    };

    row.ok_or_else(|| AppError::not_found("team not found"))
}
