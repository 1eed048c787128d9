use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::{Actor, Role, Scope};
use crate::errors::AppResult;
use crate::models::employee::{DbEmployee, Employee};
use crate::models::task::{DbTask, Task};
use crate::routes::employees::EMPLOYEE_SELECT;
use crate::routes::tasks::{scope_clause, TASK_SELECT};
use crate::utils::utc_now;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub active_employees: i64,
    pub present_today: i64,
    pub on_leave_today: i64,
    pub pending_tasks: i64,
    pub recent_employees: Vec<Employee>,
    pub recent_tasks: Vec<Task>,
}

/// Every authenticated actor gets stats over exactly their visibility scope;
/// a plain user's numbers cover their own profile and assignments only.
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "Dashboard",
    responses((status = 200, description = "Role-scoped dashboard", body = DashboardStats)),
    security(("bearer_auth" = []))
)]
pub async fn stats(State(state): State<AppState>, actor: Actor) -> AppResult<Json<DashboardStats>> {
    let scope = match actor.role {
        Role::Admin => Scope::All,
        Role::Manager => Scope::Team(actor.id),
        Role::User => Scope::Own(actor.id),
    };
    let today = utc_now().date_naive();

    let employee_clause = match scope {
        Scope::All => "",
        Scope::Team(_) => " AND u.manager_id = ?",
        Scope::Own(_) => " AND ep.user_id = ?",
    };
    let task_clause = scope_clause(&scope);

    let active_employees: i64 = {
        let sql = format!(
            "SELECT COUNT(*) FROM employee_profiles ep JOIN users u ON u.id = ep.user_id \
             WHERE ep.status = 'active'{employee_clause}"
        );
        let mut q = sqlx::query_scalar(&sql);
        match scope {
            Scope::All => {}
            Scope::Team(id) | Scope::Own(id) => q = q.bind(id),
        }
        q.fetch_one(&state.pool).await?
    };

    let present_today = attendance_count(&state.pool, &scope, employee_clause, today, "present").await?;
    let on_leave_today = attendance_count(&state.pool, &scope, employee_clause, today, "leave").await?;

    let pending_tasks: i64 = {
        let sql = format!(
            "SELECT COUNT(*) FROM tasks t LEFT JOIN users au ON au.id = t.assigned_to \
             WHERE t.status != 'completed'{task_clause}"
        );
        let mut q = sqlx::query_scalar(&sql);
        match scope {
            Scope::All => {}
            Scope::Team(id) => q = q.bind(id).bind(id),
            Scope::Own(id) => q = q.bind(id),
        }
        q.fetch_one(&state.pool).await?
    };

    let recent_employees: Vec<Employee> = {
        let sql = format!(
            "{EMPLOYEE_SELECT} WHERE 1 = 1{employee_clause} ORDER BY ep.created_at DESC LIMIT 5"
        );
        let mut q = sqlx::query_as::<_, DbEmployee>(&sql);
        match scope {
            Scope::All => {}
            Scope::Team(id) | Scope::Own(id) => q = q.bind(id),
        }
        q.fetch_all(&state.pool)
            .await?
            .into_iter()
            .map(Employee::from)
            .collect()
    };

    let recent_tasks: Vec<Task> = {
        let sql = format!("{TASK_SELECT} WHERE 1 = 1{task_clause} ORDER BY t.created_at DESC LIMIT 5");
        let mut q = sqlx::query_as::<_, DbTask>(&sql);
        match scope {
            Scope::All => {}
            Scope::Team(id) => q = q.bind(id).bind(id),
            Scope::Own(id) => q = q.bind(id),
        }
        q.fetch_all(&state.pool)
            .await?
            .into_iter()
            .map(Task::from)
            .collect()
    };

    Ok(Json(DashboardStats {
        active_employees,
        present_today,
        on_leave_today,
        pending_tasks,
        recent_employees,
        recent_tasks,
    }))
}

async fn attendance_count(
    pool: &SqlitePool,
    scope: &Scope,
    employee_clause: &str,
    today: NaiveDate,
    status: &str,
) -> AppResult<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM attendance a \
         JOIN employee_profiles ep ON ep.id = a.employee_id \
         JOIN users u ON u.id = ep.user_id \
         WHERE a.date = ? AND a.status = ?{employee_clause}"
    );
    let mut q = sqlx::query_scalar(&sql).bind(today).bind(status);
    match scope {
        Scope::All => {}
        Scope::Team(id) | Scope::Own(id) => q = q.bind(*id),
    }
    Ok(q.fetch_one(pool).await?)
}
