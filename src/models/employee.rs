use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    OnLeave,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::OnLeave => "on_leave",
            EmployeeStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
    pub employee_code: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_joining: NaiveDate,
    pub status: EmployeeStatus,
    pub team_id: Option<Uuid>,
    pub team_name: Option<String>,
    pub position: Option<String>,
    /// Monthly salary in integer minor units.
    pub base_salary: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape for employee queries. Carries the profile owner's manager so
/// handlers can build the ownership record without a second query.
#[derive(Debug, Clone, FromRow)]
pub struct DbEmployee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
    pub employee_code: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_joining: NaiveDate,
    pub status: EmployeeStatus,
    pub team_id: Option<Uuid>,
    pub team_name: Option<String>,
    pub position: Option<String>,
    pub base_salary: i64,
    pub owner_manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbEmployee> for Employee {
    fn from(value: DbEmployee) -> Self {
        Employee {
            id: value.id,
            user_id: value.user_id,
            user_name: value.user_name,
            email: value.email,
            employee_code: value.employee_code,
            phone: value.phone,
            address: value.address,
            date_of_joining: value.date_of_joining,
            status: value.status,
            team_id: value.team_id,
            team_name: value.team_name,
            position: value.position,
            base_salary: value.base_salary,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeCreateRequest {
    pub user_id: Uuid,
    #[schema(example = "EMP-0042")]
    pub employee_code: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_joining: NaiveDate,
    pub status: Option<EmployeeStatus>,
    pub team_id: Option<Uuid>,
    pub position: Option<String>,
    pub base_salary: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeUpdateRequest {
    pub employee_code: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub address: Option<Option<String>>,
    pub date_of_joining: Option<NaiveDate>,
    pub status: Option<EmployeeStatus>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub team_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub position: Option<Option<String>>,
    pub base_salary: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct EmployeeListQuery {
    /// Matches name, email, employee code or position.
    pub search: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub team: Option<Uuid>,
}
