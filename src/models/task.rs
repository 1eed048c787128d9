use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Inprogress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Inprogress => "inprogress",
            TaskStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    pub created_by: Uuid,
    pub created_by_name: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// Stamped when the task gains an assignee, cleared on unassign.
    pub assigned_at: Option<DateTime<Utc>>,
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Carries the assignee's manager so handlers can build the ownership
/// record (creator clause plus assignee roll-up) without a second query.
#[derive(Debug, Clone, FromRow)]
pub struct DbTask {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    pub created_by: Uuid,
    pub created_by_name: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub assignee_manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbTask {
    /// Overdue means the due date is in the past and the task is not done,
    /// or it was completed after its due date.
    fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => match self.status {
                TaskStatus::Completed => self.updated_at.date_naive() > due,
                _ => due < today,
            },
            None => false,
        }
    }
}

impl From<DbTask> for Task {
    fn from(value: DbTask) -> Self {
        let is_overdue = value.is_overdue(Utc::now().date_naive());
        Task {
            id: value.id,
            title: value.title,
            description: value.description,
            status: value.status,
            assigned_to: value.assigned_to,
            assigned_to_name: value.assigned_to_name,
            created_by: value.created_by,
            created_by_name: value.created_by_name,
            due_date: value.due_date,
            assigned_at: value.assigned_at,
            is_overdue,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskCreateRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

/// Full update body. Handlers inspect the raw payload's key set first: a
/// body whose keys are a subset of `{status}` routes as a status-only
/// update instead.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskUpdateRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub assigned_to: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub due_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskStatusUpdateRequest {
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct TaskListQuery {
    /// Matches title or description.
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    /// Honored for admin and manager actors only.
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct TaskCalendarQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_task(status: TaskStatus, due: Option<NaiveDate>, updated: &str) -> DbTask {
        DbTask {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: None,
            status,
            assigned_to: None,
            assigned_to_name: None,
            created_by: Uuid::new_v4(),
            created_by_name: None,
            due_date: due,
            assigned_at: None,
            assignee_manager_id: None,
            created_at: Utc::now(),
            updated_at: format!("{updated}T10:00:00Z").parse().unwrap(),
        }
    }

    #[test]
    fn overdue_when_past_due_and_open() {
        let today: NaiveDate = "2026-03-15".parse().unwrap();
        let due: NaiveDate = "2026-03-10".parse().unwrap();
        assert!(db_task(TaskStatus::Todo, Some(due), "2026-03-01").is_overdue(today));
        assert!(db_task(TaskStatus::Inprogress, Some(due), "2026-03-01").is_overdue(today));
        assert!(!db_task(TaskStatus::Todo, None, "2026-03-01").is_overdue(today));
    }

    #[test]
    fn overdue_when_completed_late() {
        let today: NaiveDate = "2026-03-15".parse().unwrap();
        let due: NaiveDate = "2026-03-10".parse().unwrap();
        assert!(db_task(TaskStatus::Completed, Some(due), "2026-03-12").is_overdue(today));
        assert!(!db_task(TaskStatus::Completed, Some(due), "2026-03-09").is_overdue(today));
    }
}
