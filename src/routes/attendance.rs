use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{list_scope, require, Actor, Operation, Ownership, Resource, Role, Scope};
use crate::errors::{AppError, AppResult};
use crate::models::attendance::{
    Attendance, AttendanceCreateRequest, AttendanceListQuery, AttendanceUpdateRequest, DbAttendance,
};
use crate::utils::utc_now;

const ATTENDANCE_SELECT: &str = "SELECT a.id, a.employee_id, u.name AS employee_name, \
     ep.employee_code, a.date, a.status, a.check_in, a.check_out, a.notes, \
     a.marked_by, mb.name AS marked_by_name, \
     ep.user_id AS owner_user_id, u.manager_id AS owner_manager_id, \
     a.created_at, a.updated_at \
     FROM attendance a \
     JOIN employee_profiles ep ON ep.id = a.employee_id \
     JOIN users u ON u.id = ep.user_id \
     LEFT JOIN users mb ON mb.id = a.marked_by";

#[utoipa::path(
    get,
    path = "/attendance",
    tag = "Attendance",
    params(AttendanceListQuery),
    responses((status = 200, description = "Visible attendance records", body = [Attendance])),
    security(("bearer_auth" = []))
)]
pub async fn list_attendance(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<AttendanceListQuery>,
) -> AppResult<Json<Vec<Attendance>>> {
    let scope = list_scope(&actor, Resource::Attendance)?;

    let mut sql = format!("{ATTENDANCE_SELECT} WHERE 1 = 1");
    match scope {
        Scope::All => {}
        Scope::Team(_) => sql.push_str(" AND u.manager_id = ?"),
        Scope::Own(_) => sql.push_str(" AND ep.user_id = ?"),
    }
    if query.employee_id.is_some() {
        sql.push_str(" AND a.employee_id = ?");
    }
    if query.start_date.is_some() {
        sql.push_str(" AND a.date >= ?");
    }
    if query.end_date.is_some() {
        sql.push_str(" AND a.date <= ?");
    }
    if query.month.is_some() && query.year.is_some() {
        sql.push_str(
            " AND CAST(strftime('%m', a.date) AS INTEGER) = ? AND CAST(strftime('%Y', a.date) AS INTEGER) = ?",
        );
    }
    sql.push_str(" ORDER BY a.date DESC, a.created_at DESC");

    let mut q = sqlx::query_as::<_, DbAttendance>(&sql);
    match scope {
        Scope::All => {}
        Scope::Team(id) | Scope::Own(id) => q = q.bind(id),
    }
    if let Some(employee_id) = query.employee_id {
        q = q.bind(employee_id);
    }
    if let Some(start) = query.start_date {
        q = q.bind(start);
    }
    if let Some(end) = query.end_date {
        q = q.bind(end);
    }
    if let (Some(month), Some(year)) = (query.month, query.year) {
        q = q.bind(month).bind(year);
    }

    let rows = q.fetch_all(&state.pool).await?;
    Ok(Json(rows.into_iter().map(Attendance::from).collect()))
}

#[utoipa::path(
    post,
    path = "/attendance",
    tag = "Attendance",
    request_body = AttendanceCreateRequest,
    responses(
        (status = 201, description = "Attendance recorded", body = Attendance),
        (status = 409, description = "Already recorded for that date")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_attendance(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<AttendanceCreateRequest>,
) -> AppResult<(StatusCode, Json<Attendance>)> {
    require(&actor, Resource::Attendance, Operation::Create, None)?;

    // Plain users may only mark their own attendance; any employee_id in the
    // payload is ignored and the record is pinned to their profile.
    let employee_id = match actor.role {
        Role::User => own_profile_id(&state.pool, actor.id).await?,
        _ => payload
            .employee_id
            .ok_or_else(|| AppError::bad_request("employee_id is required"))?,
    };

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employee_profiles WHERE id = ?)")
            .bind(employee_id)
            .fetch_one(&state.pool)
            .await?;
    if !exists {
        return Err(AppError::bad_request("employee_id does not exist"));
    }

    ensure_unique_date(&state.pool, employee_id, payload.date, None).await?;

    let id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO attendance (id, employee_id, date, status, check_in, check_out, notes, marked_by, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(employee_id)
    .bind(payload.date)
    .bind(payload.status)
    .bind(payload.check_in)
    .bind(payload.check_out)
    .bind(&payload.notes)
    .bind(actor.id)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let record = fetch_attendance(&state.pool, &Scope::All, id).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/attendance/{id}",
    tag = "Attendance",
    params(("id" = Uuid, Path, description = "Attendance id")),
    responses((status = 200, description = "Attendance detail", body = Attendance)),
    security(("bearer_auth" = []))
)]
pub async fn get_attendance(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Attendance>> {
    let scope = list_scope(&actor, Resource::Attendance)?;
    let record = fetch_attendance(&state.pool, &scope, id).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    put,
    path = "/attendance/{id}",
    tag = "Attendance",
    params(("id" = Uuid, Path, description = "Attendance id")),
    request_body = AttendanceUpdateRequest,
    responses((status = 200, description = "Attendance updated", body = Attendance)),
    security(("bearer_auth" = []))
)]
pub async fn update_attendance(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttendanceUpdateRequest>,
) -> AppResult<Json<Attendance>> {
    let scope = list_scope(&actor, Resource::Attendance)?;
    let current = fetch_attendance(&state.pool, &scope, id).await?;
    require(
        &actor,
        Resource::Attendance,
        Operation::UpdateFull,
        Some(&Ownership::attendance(current.owner_user_id, current.owner_manager_id)),
    )?;

    let date = payload.date.unwrap_or(current.date);
    if date != current.date {
        ensure_unique_date(&state.pool, current.employee_id, date, Some(id)).await?;
    }
    let status = payload.status.unwrap_or(current.status);
    let check_in = payload.check_in.unwrap_or(current.check_in);
    let check_out = payload.check_out.unwrap_or(current.check_out);
    let notes = payload.notes.unwrap_or(current.notes);

    sqlx::query(
        "UPDATE attendance SET date = ?, status = ?, check_in = ?, check_out = ?, notes = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(date)
    .bind(status)
    .bind(check_in)
    .bind(check_out)
    .bind(&notes)
    .bind(utc_now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    let record = fetch_attendance(&state.pool, &Scope::All, id).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    delete,
    path = "/attendance/{id}",
    tag = "Attendance",
    params(("id" = Uuid, Path, description = "Attendance id")),
    responses((status = 204, description = "Attendance deleted")),
    security(("bearer_auth" = []))
)]
pub async fn delete_attendance(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let scope = list_scope(&actor, Resource::Attendance)?;
    let current = fetch_attendance(&state.pool, &scope, id).await?;
    require(
        &actor,
        Resource::Attendance,
        Operation::Delete,
        Some(&Ownership::attendance(current.owner_user_id, current.owner_manager_id)),
    )?;

    sqlx::query("DELETE FROM attendance WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_attendance(pool: &SqlitePool, scope: &Scope, id: Uuid) -> AppResult<DbAttendance> {
    let mut sql = format!("{ATTENDANCE_SELECT} WHERE a.id = ?");
    match scope {
        Scope::All => {}
        Scope::Team(_) => sql.push_str(" AND u.manager_id = ?"),
        Scope::Own(_) => sql.push_str(" AND ep.user_id = ?"),
    }

    let mut q = sqlx::query_as::<_, DbAttendance>(&sql).bind(id);
    match scope {
        Scope::All => {}
        Scope::Team(scope_id) | Scope::Own(scope_id) => q = q.bind(*scope_id),
    }

    q.fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("attendance record not found"))
}

async fn own_profile_id(pool: &SqlitePool, user_id: Uuid) -> AppResult<Uuid> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM employee_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::bad_request("no employee profile for this account"))
}

async fn ensure_unique_date(
    pool: &SqlitePool,
    employee_id: Uuid,
    date: NaiveDate,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let exists: bool = match exclude {
        Some(id) => {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM attendance WHERE employee_id = ? AND date = ? AND id != ?)",
            )
            .bind(employee_id)
            .bind(date)
            .bind(id)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM attendance WHERE employee_id = ? AND date = ?)")
                .bind(employee_id)
                .bind(date)
                .fetch_one(pool)
                .await?
        }
    };

    if exists {
        Err(AppError::conflict("attendance already recorded for that date"))
    } else {
        Ok(())
    }
}
