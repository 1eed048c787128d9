use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PayrollStatus {
    Draft,
    Processed,
    Paid,
}

impl PayrollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollStatus::Draft => "draft",
            PayrollStatus::Processed => "processed",
            PayrollStatus::Paid => "paid",
        }
    }
}

/// All money fields are integer minor units.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Payroll {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_code: String,
    pub month: u32,
    pub year: i32,
    pub base_salary: i64,
    pub days_worked: i64,
    pub days_present: i64,
    pub days_absent: i64,
    pub days_on_leave: i64,
    pub deductions: i64,
    pub bonuses: i64,
    pub final_pay: i64,
    pub status: PayrollStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbPayroll {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_code: String,
    pub month: u32,
    pub year: i32,
    pub base_salary: i64,
    pub days_worked: i64,
    pub days_present: i64,
    pub days_absent: i64,
    pub days_on_leave: i64,
    pub deductions: i64,
    pub bonuses: i64,
    pub final_pay: i64,
    pub status: PayrollStatus,
    pub owner_user_id: Uuid,
    pub owner_manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbPayroll> for Payroll {
    fn from(value: DbPayroll) -> Self {
        Payroll {
            id: value.id,
            employee_id: value.employee_id,
            employee_name: value.employee_name,
            employee_code: value.employee_code,
            month: value.month,
            year: value.year,
            base_salary: value.base_salary,
            days_worked: value.days_worked,
            days_present: value.days_present,
            days_absent: value.days_absent,
            days_on_leave: value.days_on_leave,
            deductions: value.deductions,
            bonuses: value.bonuses,
            final_pay: value.final_pay,
            status: value.status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// `max(0, base_salary / 30 * days_worked - deductions + bonuses)`.
pub fn compute_final_pay(base_salary: i64, days_worked: i64, deductions: i64, bonuses: i64) -> i64 {
    let earned = base_salary / 30 * days_worked;
    (earned - deductions + bonuses).max(0)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayrollCreateRequest {
    pub employee_id: Uuid,
    #[schema(minimum = 1, maximum = 12)]
    pub month: u32,
    pub year: i32,
    /// Defaults to the employee profile's base salary when omitted.
    pub base_salary: Option<i64>,
    pub days_worked: Option<i64>,
    pub days_present: Option<i64>,
    pub days_absent: Option<i64>,
    pub days_on_leave: Option<i64>,
    pub deductions: Option<i64>,
    pub bonuses: Option<i64>,
    /// Computed from the other fields when omitted or zero.
    pub final_pay: Option<i64>,
    pub status: Option<PayrollStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayrollUpdateRequest {
    pub base_salary: Option<i64>,
    pub days_worked: Option<i64>,
    pub days_present: Option<i64>,
    pub days_absent: Option<i64>,
    pub days_on_leave: Option<i64>,
    pub deductions: Option<i64>,
    pub bonuses: Option<i64>,
    pub final_pay: Option<i64>,
    pub status: Option<PayrollStatus>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PayrollListQuery {
    pub employee_id: Option<Uuid>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}
