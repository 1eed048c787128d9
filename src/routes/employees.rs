use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{list_scope, require, Actor, Operation, Ownership, Resource, Scope};
use crate::errors::{AppError, AppResult};
use crate::models::employee::{
    DbEmployee, Employee, EmployeeCreateRequest, EmployeeListQuery, EmployeeUpdateRequest,
};
use crate::utils::utc_now;

pub(crate) const EMPLOYEE_SELECT: &str = "SELECT ep.id, ep.user_id, u.name AS user_name, u.email, \
     ep.employee_code, ep.phone, ep.address, ep.date_of_joining, ep.status, \
     ep.team_id, t.name AS team_name, ep.position, ep.base_salary, \
     u.manager_id AS owner_manager_id, ep.created_at, ep.updated_at \
     FROM employee_profiles ep \
     JOIN users u ON u.id = ep.user_id \
     LEFT JOIN teams t ON t.id = ep.team_id";

#[utoipa::path(
    get,
    path = "/employees",
    tag = "Employees",
    params(EmployeeListQuery),
    responses((status = 200, description = "Visible employee profiles", body = [Employee])),
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<EmployeeListQuery>,
) -> AppResult<Json<Vec<Employee>>> {
    let scope = list_scope(&actor, Resource::Employee)?;

    let mut sql = format!("{EMPLOYEE_SELECT} WHERE 1 = 1");
    match scope {
        Scope::All => {}
        Scope::Team(_) => sql.push_str(" AND u.manager_id = ?"),
        Scope::Own(_) => sql.push_str(" AND ep.user_id = ?"),
    }
    if query.search.is_some() {
        sql.push_str(
            " AND (u.name LIKE ? OR u.email LIKE ? OR ep.employee_code LIKE ? OR ep.position LIKE ?)",
        );
    }
    if query.status.is_some() {
        sql.push_str(" AND ep.status = ?");
    }
    if query.team.is_some() {
        sql.push_str(" AND ep.team_id = ?");
    }
    sql.push_str(" ORDER BY ep.created_at DESC");

    let mut q = sqlx::query_as::<_, DbEmployee>(&sql);
    match scope {
        Scope::All => {}
        Scope::Team(id) | Scope::Own(id) => q = q.bind(id),
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search.trim());
        q = q.bind(pattern.clone()).bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
    }
    if let Some(status) = query.status {
        q = q.bind(status);
    }
    if let Some(team) = query.team {
        q = q.bind(team);
    }

    let rows = q.fetch_all(&state.pool).await?;
    Ok(Json(rows.into_iter().map(Employee::from).collect()))
}

#[utoipa::path(
    post,
    path = "/employees",
    tag = "Employees",
    request_body = EmployeeCreateRequest,
    responses(
        (status = 201, description = "Profile created", body = Employee),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<EmployeeCreateRequest>,
) -> AppResult<(StatusCode, Json<Employee>)> {
    require(&actor, Resource::Employee, Operation::Create, None)?;

    let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(payload.user_id)
        .fetch_one(&state.pool)
        .await?;
    if !user_exists {
        return Err(AppError::bad_request("user_id does not exist"));
    }

    let has_profile: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employee_profiles WHERE user_id = ?)")
            .bind(payload.user_id)
            .fetch_one(&state.pool)
            .await?;
    if has_profile {
        return Err(AppError::conflict("user already has an employee profile"));
    }

    let code = payload.employee_code.trim();
    if code.is_empty() {
        return Err(AppError::bad_request("employee_code is required"));
    }
    let code_taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employee_profiles WHERE employee_code = ?)")
            .bind(code)
            .fetch_one(&state.pool)
            .await?;
    if code_taken {
        return Err(AppError::conflict("employee code already in use"));
    }

    if let Some(team_id) = payload.team_id {
        ensure_team(&state.pool, team_id).await?;
    }

    let id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO employee_profiles \
         (id, user_id, employee_code, phone, address, date_of_joining, status, team_id, position, base_salary, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, COALESCE(?, 'active'), ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(payload.user_id)
    .bind(code)
    .bind(&payload.phone)
    .bind(&payload.address)
    .bind(payload.date_of_joining)
    .bind(payload.status)
    .bind(payload.team_id)
    .bind(&payload.position)
    .bind(payload.base_salary.unwrap_or(0))
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let employee = fetch_employee(&state.pool, &Scope::All, id).await?;
    Ok((StatusCode::CREATED, Json(employee.into())))
}

#[utoipa::path(
    get,
    path = "/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "Employee profile id")),
    responses((status = 200, description = "Profile detail", body = Employee)),
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Employee>> {
    let scope = list_scope(&actor, Resource::Employee)?;
    let employee = fetch_employee(&state.pool, &scope, id).await?;
    Ok(Json(employee.into()))
}

#[utoipa::path(
    put,
    path = "/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "Employee profile id")),
    request_body = EmployeeUpdateRequest,
    responses((status = 200, description = "Profile updated", body = Employee)),
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<EmployeeUpdateRequest>,
) -> AppResult<Json<Employee>> {
    let scope = list_scope(&actor, Resource::Employee)?;
    let current = fetch_employee(&state.pool, &scope, id).await?;
    require(
        &actor,
        Resource::Employee,
        Operation::UpdateFull,
        Some(&Ownership::employee(current.user_id, current.owner_manager_id)),
    )?;

    let employee_code = match payload.employee_code {
        Some(code) => {
            let code = code.trim().to_string();
            if code.is_empty() {
                return Err(AppError::bad_request("employee_code is required"));
            }
            if code != current.employee_code {
                let taken: bool = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM employee_profiles WHERE employee_code = ? AND id != ?)",
                )
                .bind(&code)
                .bind(id)
                .fetch_one(&state.pool)
                .await?;
                if taken {
                    return Err(AppError::conflict("employee code already in use"));
                }
            }
            code
        }
        None => current.employee_code,
    };
    let phone = payload.phone.unwrap_or(current.phone);
    let address = payload.address.unwrap_or(current.address);
    let date_of_joining = payload.date_of_joining.unwrap_or(current.date_of_joining);
    let status = payload.status.unwrap_or(current.status);
    let team_id = match payload.team_id {
        Some(team_id) => {
            if let Some(team_id) = team_id {
                ensure_team(&state.pool, team_id).await?;
            }
            team_id
        }
        None => current.team_id,
    };
    let position = payload.position.unwrap_or(current.position);
    let base_salary = payload.base_salary.unwrap_or(current.base_salary);

    sqlx::query(
        "UPDATE employee_profiles SET employee_code = ?, phone = ?, address = ?, date_of_joining = ?, \
         status = ?, team_id = ?, position = ?, base_salary = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&employee_code)
    .bind(&phone)
    .bind(&address)
    .bind(date_of_joining)
    .bind(status)
    .bind(team_id)
    .bind(&position)
    .bind(base_salary)
    .bind(utc_now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    let employee = fetch_employee(&state.pool, &Scope::All, id).await?;
    Ok(Json(employee.into()))
}

#[utoipa::path(
    delete,
    path = "/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "Employee profile id")),
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let scope = list_scope(&actor, Resource::Employee)?;
    let current = fetch_employee(&state.pool, &scope, id).await?;
    require(
        &actor,
        Resource::Employee,
        Operation::Delete,
        Some(&Ownership::employee(current.user_id, current.owner_manager_id)),
    )?;

    sqlx::query("DELETE FROM employee_profiles WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_employee(pool: &SqlitePool, scope: &Scope, id: Uuid) -> AppResult<DbEmployee> {
    let mut sql = format!("{EMPLOYEE_SELECT} WHERE ep.id = ?");
    match scope {
        Scope::All => {}
        Scope::Team(_) => sql.push_str(" AND u.manager_id = ?"),
        Scope::Own(_) => sql.push_str(" AND ep.user_id = ?"),
    }

    let mut q = sqlx::query_as::<_, DbEmployee>(&sql).bind(id);
    match scope {
        Scope::All => {}
        Scope::Team(scope_id) | Scope::Own(scope_id) => q = q.bind(*scope_id),
    }

    q.fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("employee not found"))
}

async fn ensure_team(pool: &SqlitePool, team_id: Uuid) -> AppResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE id = ?)")
        .bind(team_id)
        .fetch_one(pool)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::bad_request("team_id does not exist"))
    }
}
