use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{list_scope, require, Actor, Operation, Ownership, Resource, Role, Scope};
use crate::errors::{AppError, AppResult};
use crate::models::task::{
    DbTask, Task, TaskCalendarQuery, TaskCreateRequest, TaskListQuery, TaskStatusUpdateRequest,
    TaskUpdateRequest,
};
use crate::utils::utc_now;

pub(crate) const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.status, \
     t.assigned_to, au.name AS assigned_to_name, \
     t.created_by, cu.name AS created_by_name, \
     t.due_date, t.assigned_at, au.manager_id AS assignee_manager_id, \
     t.created_at, t.updated_at \
     FROM tasks t \
     LEFT JOIN users au ON au.id = t.assigned_to \
     LEFT JOIN users cu ON cu.id = t.created_by";

#[utoipa::path(
    get,
    path = "/tasks",
    tag = "Tasks",
    params(TaskListQuery),
    responses((status = 200, description = "Visible tasks", body = [Task])),
    security(("bearer_auth" = []))
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<TaskListQuery>,
) -> AppResult<Json<Vec<Task>>> {
    let scope = list_scope(&actor, Resource::Task)?;

    let mut sql = format!("{TASK_SELECT} WHERE 1 = 1{}", scope_clause(&scope));
    if query.search.is_some() {
        sql.push_str(" AND (t.title LIKE ? OR t.description LIKE ?)");
    }
    if query.status.is_some() {
        sql.push_str(" AND t.status = ?");
    }
    let assignee_filter = match actor.role {
        Role::User => None,
        _ => query.assigned_to,
    };
    if assignee_filter.is_some() {
        sql.push_str(" AND t.assigned_to = ?");
    }
    sql.push_str(" ORDER BY t.created_at DESC");

    let mut q = sqlx::query_as::<_, DbTask>(&sql);
    q = bind_scope(q, &scope);
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search.trim());
        q = q.bind(pattern.clone()).bind(pattern);
    }
    if let Some(status) = query.status {
        q = q.bind(status);
    }
    if let Some(assigned_to) = assignee_filter {
        q = q.bind(assigned_to);
    }

    let rows = q.fetch_all(&state.pool).await?;
    Ok(Json(rows.into_iter().map(Task::from).collect()))
}

#[utoipa::path(
    get,
    path = "/tasks/calendar",
    tag = "Tasks",
    params(TaskCalendarQuery),
    responses((status = 200, description = "Schedulable tasks", body = [Task])),
    security(("bearer_auth" = []))
)]
pub async fn calendar(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<TaskCalendarQuery>,
) -> AppResult<Json<Vec<Task>>> {
    let scope = list_scope(&actor, Resource::Task)?;

    let mut sql = format!(
        "{TASK_SELECT} WHERE (t.due_date IS NOT NULL OR t.assigned_at IS NOT NULL){}",
        scope_clause(&scope)
    );
    if query.start_date.is_some() {
        sql.push_str(" AND COALESCE(t.due_date, date(t.assigned_at)) >= ?");
    }
    if query.end_date.is_some() {
        sql.push_str(" AND COALESCE(t.due_date, date(t.assigned_at)) <= ?");
    }
    sql.push_str(" ORDER BY t.due_date ASC, t.assigned_at ASC");

    let mut q = sqlx::query_as::<_, DbTask>(&sql);
    q = bind_scope(q, &scope);
    if let Some(start) = query.start_date {
        q = q.bind(start);
    }
    if let Some(end) = query.end_date {
        q = q.bind(end);
    }

    let rows = q.fetch_all(&state.pool).await?;
    Ok(Json(rows.into_iter().map(Task::from).collect()))
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = "Tasks",
    request_body = TaskCreateRequest,
    responses((status = 201, description = "Task created", body = Task)),
    security(("bearer_auth" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<TaskCreateRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    require(&actor, Resource::Task, Operation::Create, None)?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title is required"));
    }
    if let Some(assigned_to) = payload.assigned_to {
        ensure_user_exists(&state.pool, assigned_to).await?;
    }

    let id = Uuid::new_v4();
    let now = utc_now();
    let assigned_at: Option<DateTime<Utc>> = payload.assigned_to.map(|_| now);

    sqlx::query(
        "INSERT INTO tasks (id, title, description, status, assigned_to, created_by, due_date, assigned_at, created_at, updated_at) \
         VALUES (?, ?, ?, COALESCE(?, 'todo'), ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(title)
    .bind(&payload.description)
    .bind(payload.status)
    .bind(payload.assigned_to)
    .bind(actor.id)
    .bind(payload.due_date)
    .bind(assigned_at)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let task = fetch_task(&state.pool, &Scope::All, id).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    responses((status = 200, description = "Task detail", body = Task)),
    security(("bearer_auth" = []))
)]
pub async fn get_task(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Task>> {
    let scope = list_scope(&actor, Resource::Task)?;
    let task = fetch_task(&state.pool, &scope, id).await?;
    Ok(Json(task.into()))
}

#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = TaskUpdateRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 403, description = "Assignees may only change status")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<Task>> {
    // The operation is classified from the raw key set before any value is
    // deserialized: a body whose key set is exactly {status} routes as a
    // status-only update, anything else (including an empty body) as a full
    // update.
    let object = body
        .as_object()
        .ok_or_else(|| AppError::bad_request("expected a JSON object"))?;
    let status_only = !object.is_empty() && object.keys().all(|key| key == "status");

    let scope = list_scope(&actor, Resource::Task)?;
    let current = fetch_task(&state.pool, &scope, id).await?;
    let ownership = Ownership::task(current.created_by, current.assigned_to, current.assignee_manager_id);

    let operation = if status_only {
        Operation::UpdateStatusOnly
    } else {
        Operation::UpdateFull
    };
    require(&actor, Resource::Task, operation, Some(&ownership))?;

    if status_only {
        let payload: TaskStatusUpdateRequest = serde_json::from_value(body)
            .map_err(|err| AppError::bad_request(format!("invalid payload: {err}")))?;
        let status = payload.status.unwrap_or(current.status);

        sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(utc_now())
            .bind(id)
            .execute(&state.pool)
            .await?;
    } else {
        let payload: TaskUpdateRequest = serde_json::from_value(body)
            .map_err(|err| AppError::bad_request(format!("invalid payload: {err}")))?;

        let title = match payload.title {
            Some(title) => {
                let title = title.trim().to_string();
                if title.is_empty() {
                    return Err(AppError::bad_request("title is required"));
                }
                title
            }
            None => current.title.clone(),
        };
        let description = payload.description.unwrap_or(current.description.clone());
        let status = payload.status.unwrap_or(current.status);
        let due_date = payload.due_date.unwrap_or(current.due_date);

        // Assignment transitions: a new assignee stamps assigned_at, keeping
        // the same assignee keeps the original stamp, unassigning clears both
        // columns in the one statement.
        let (assigned_to, assigned_at) = match payload.assigned_to {
            None => (current.assigned_to, current.assigned_at),
            Some(None) => (None, None),
            Some(Some(new_assignee)) => {
                if current.assigned_to == Some(new_assignee) {
                    (Some(new_assignee), current.assigned_at)
                } else {
                    ensure_user_exists(&state.pool, new_assignee).await?;
                    (Some(new_assignee), Some(utc_now()))
                }
            }
        };

        sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, status = ?, assigned_to = ?, due_date = ?, \
             assigned_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&title)
        .bind(&description)
        .bind(status)
        .bind(assigned_to)
        .bind(due_date)
        .bind(assigned_at)
        .bind(utc_now())
        .bind(id)
        .execute(&state.pool)
        .await?;
    }

    let task = fetch_task(&state.pool, &Scope::All, id).await?;
    Ok(Json(task.into()))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    responses((status = 204, description = "Task deleted")),
    security(("bearer_auth" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let scope = list_scope(&actor, Resource::Task)?;
    let current = fetch_task(&state.pool, &scope, id).await?;
    require(
        &actor,
        Resource::Task,
        Operation::Delete,
        Some(&Ownership::task(current.created_by, current.assigned_to, current.assignee_manager_id)),
    )?;

    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// WHERE fragment matching [`TASK_SELECT`]'s aliases. A manager sees tasks
/// they created or tasks assigned into their team, matching the targeted
/// ownership check.
pub(crate) fn scope_clause(scope: &Scope) -> &'static str {
    match scope {
        Scope::All => "",
        Scope::Team(_) => " AND (t.created_by = ? OR au.manager_id = ?)",
        Scope::Own(_) => " AND t.assigned_to = ?",
    }
}

fn bind_scope<'q>(
    q: sqlx::query::QueryAs<'q, sqlx::Sqlite, DbTask, sqlx::sqlite::SqliteArguments<'q>>,
    scope: &Scope,
) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, DbTask, sqlx::sqlite::SqliteArguments<'q>> {
    match scope {
        Scope::All => q,
        Scope::Team(id) => q.bind(*id).bind(*id),
        Scope::Own(id) => q.bind(*id),
    }
}

async fn fetch_task(pool: &SqlitePool, scope: &Scope, id: Uuid) -> AppResult<DbTask> {
    let sql = format!("{TASK_SELECT} WHERE t.id = ?{}", scope_clause(scope));

    let mut q = sqlx::query_as::<_, DbTask>(&sql).bind(id);
    q = bind_scope(q, scope);

    q.fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("task not found"))
}

async fn ensure_user_exists(pool: &SqlitePool, user_id: Uuid) -> AppResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::bad_request("assigned_to does not exist"))
    }
}
