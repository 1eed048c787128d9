use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{list_scope, require, Actor, Operation, Ownership, Resource, Scope};
use crate::errors::{AppError, AppResult};
use crate::models::payroll::{
    compute_final_pay, DbPayroll, Payroll, PayrollCreateRequest, PayrollListQuery,
    PayrollStatus, PayrollUpdateRequest,
};
use crate::utils::utc_now;

const PAYROLL_SELECT: &str = "SELECT p.id, p.employee_id, u.name AS employee_name, \
     ep.employee_code, p.month, p.year, p.base_salary, p.days_worked, p.days_present, \
     p.days_absent, p.days_on_leave, p.deductions, p.bonuses, p.final_pay, p.status, \
     ep.user_id AS owner_user_id, u.manager_id AS owner_manager_id, \
     p.created_at, p.updated_at \
     FROM payroll p \
     JOIN employee_profiles ep ON ep.id = p.employee_id \
     JOIN users u ON u.id = ep.user_id";

#[utoipa::path(
    get,
    path = "/payroll",
    tag = "Payroll",
    params(PayrollListQuery),
    responses((status = 200, description = "Visible payroll records", body = [Payroll])),
    security(("bearer_auth" = []))
)]
pub async fn list_payroll(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<PayrollListQuery>,
) -> AppResult<Json<Vec<Payroll>>> {
    let scope = list_scope(&actor, Resource::Payroll)?;

    let mut sql = format!("{PAYROLL_SELECT} WHERE 1 = 1");
    match scope {
        Scope::All => {}
        Scope::Team(_) => sql.push_str(" AND u.manager_id = ?"),
        Scope::Own(_) => sql.push_str(" AND ep.user_id = ?"),
    }
    if query.employee_id.is_some() {
        sql.push_str(" AND p.employee_id = ?");
    }
    if query.month.is_some() {
        sql.push_str(" AND p.month = ?");
    }
    if query.year.is_some() {
        sql.push_str(" AND p.year = ?");
    }
    sql.push_str(" ORDER BY p.year DESC, p.month DESC, p.created_at DESC");

    let mut q = sqlx::query_as::<_, DbPayroll>(&sql);
    match scope {
        Scope::All => {}
        Scope::Team(id) | Scope::Own(id) => q = q.bind(id),
    }
    if let Some(employee_id) = query.employee_id {
        q = q.bind(employee_id);
    }
    if let Some(month) = query.month {
        q = q.bind(month);
    }
    if let Some(year) = query.year {
        q = q.bind(year);
    }

    let rows = q.fetch_all(&state.pool).await?;
    Ok(Json(rows.into_iter().map(Payroll::from).collect()))
}

#[utoipa::path(
    post,
    path = "/payroll",
    tag = "Payroll",
    request_body = PayrollCreateRequest,
    responses(
        (status = 201, description = "Payroll created", body = Payroll),
        (status = 409, description = "Already exists for that month")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_payroll(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<PayrollCreateRequest>,
) -> AppResult<(StatusCode, Json<Payroll>)> {
    require(&actor, Resource::Payroll, Operation::Create, None)?;

    if !(1..=12).contains(&payload.month) {
        return Err(AppError::bad_request("month must be between 1 and 12"));
    }

    let profile_salary: Option<i64> =
        sqlx::query_scalar("SELECT base_salary FROM employee_profiles WHERE id = ?")
            .bind(payload.employee_id)
            .fetch_optional(&state.pool)
            .await?;
    let profile_salary = profile_salary.ok_or_else(|| AppError::bad_request("employee_id does not exist"))?;

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM payroll WHERE employee_id = ? AND month = ? AND year = ?)",
    )
    .bind(payload.employee_id)
    .bind(payload.month)
    .bind(payload.year)
    .fetch_one(&state.pool)
    .await?;
    if exists {
        return Err(AppError::conflict("payroll already exists for that month"));
    }

    let base_salary = payload.base_salary.unwrap_or(profile_salary);
    let days_worked = payload.days_worked.unwrap_or(0);
    let deductions = payload.deductions.unwrap_or(0);
    let bonuses = payload.bonuses.unwrap_or(0);
    let final_pay = match payload.final_pay {
        Some(pay) if pay != 0 => pay,
        _ => compute_final_pay(base_salary, days_worked, deductions, bonuses),
    };

    let id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO payroll \
         (id, employee_id, month, year, base_salary, days_worked, days_present, days_absent, days_on_leave, \
          deductions, bonuses, final_pay, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(payload.employee_id)
    .bind(payload.month)
    .bind(payload.year)
    .bind(base_salary)
    .bind(days_worked)
    .bind(payload.days_present.unwrap_or(0))
    .bind(payload.days_absent.unwrap_or(0))
    .bind(payload.days_on_leave.unwrap_or(0))
    .bind(deductions)
    .bind(bonuses)
    .bind(final_pay)
    .bind(payload.status.unwrap_or(PayrollStatus::Draft))
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let record = fetch_payroll(&state.pool, &Scope::All, id).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/payroll/{id}",
    tag = "Payroll",
    params(("id" = Uuid, Path, description = "Payroll id")),
    responses((status = 200, description = "Payroll detail", body = Payroll)),
    security(("bearer_auth" = []))
)]
pub async fn get_payroll(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Payroll>> {
    let scope = list_scope(&actor, Resource::Payroll)?;
    let record = fetch_payroll(&state.pool, &scope, id).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    put,
    path = "/payroll/{id}",
    tag = "Payroll",
    params(("id" = Uuid, Path, description = "Payroll id")),
    request_body = PayrollUpdateRequest,
    responses((status = 200, description = "Payroll updated", body = Payroll)),
    security(("bearer_auth" = []))
)]
pub async fn update_payroll(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<PayrollUpdateRequest>,
) -> AppResult<Json<Payroll>> {
    let scope = list_scope(&actor, Resource::Payroll)?;
    let current = fetch_payroll(&state.pool, &scope, id).await?;
    require(
        &actor,
        Resource::Payroll,
        Operation::UpdateFull,
        Some(&Ownership::payroll(current.owner_user_id, current.owner_manager_id)),
    )?;

    let base_salary = payload.base_salary.unwrap_or(current.base_salary);
    let days_worked = payload.days_worked.unwrap_or(current.days_worked);
    let deductions = payload.deductions.unwrap_or(current.deductions);
    let bonuses = payload.bonuses.unwrap_or(current.bonuses);
    let final_pay = match payload.final_pay {
        Some(pay) if pay != 0 => pay,
        _ => compute_final_pay(base_salary, days_worked, deductions, bonuses),
    };

    sqlx::query(
        "UPDATE payroll SET base_salary = ?, days_worked = ?, days_present = ?, days_absent = ?, \
         days_on_leave = ?, deductions = ?, bonuses = ?, final_pay = ?, status = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(base_salary)
    .bind(days_worked)
    .bind(payload.days_present.unwrap_or(current.days_present))
    .bind(payload.days_absent.unwrap_or(current.days_absent))
    .bind(payload.days_on_leave.unwrap_or(current.days_on_leave))
    .bind(deductions)
    .bind(bonuses)
    .bind(final_pay)
    .bind(payload.status.unwrap_or(current.status))
    .bind(utc_now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    let record = fetch_payroll(&state.pool, &Scope::All, id).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    delete,
    path = "/payroll/{id}",
    tag = "Payroll",
    params(("id" = Uuid, Path, description = "Payroll id")),
    responses((status = 204, description = "Payroll deleted")),
    security(("bearer_auth" = []))
)]
pub async fn delete_payroll(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let scope = list_scope(&actor, Resource::Payroll)?;
    let current = fetch_payroll(&state.pool, &scope, id).await?;
    require(
        &actor,
        Resource::Payroll,
        Operation::Delete,
        Some(&Ownership::payroll(current.owner_user_id, current.owner_manager_id)),
    )?;

    sqlx::query("DELETE FROM payroll WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_payroll(pool: &SqlitePool, scope: &Scope, id: Uuid) -> AppResult<DbPayroll> {
    let mut sql = format!("{PAYROLL_SELECT} WHERE p.id = ?");
    match scope {
        Scope::All => {}
        Scope::Team(_) => sql.push_str(" AND u.manager_id = ?"),
        Scope::Own(_) => sql.push_str(" AND ep.user_id = ?"),
    }

    let mut q = sqlx::query_as::<_, DbPayroll>(&sql).bind(id);
    match scope {
        Scope::All => {}
        Scope::Team(scope_id) | Scope::Own(scope_id) => q = q.bind(*scope_id),
    }

    q.fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("payroll record not found"))
}
