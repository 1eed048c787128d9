use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    HalfDay,
    Leave,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::HalfDay => "half_day",
            AttendanceStatus::Leave => "leave",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attendance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_code: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub notes: Option<String>,
    pub marked_by: Option<Uuid>,
    pub marked_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attendance ownership resolves through employee -> user -> manager; the
/// query joins both hops so handlers get the owner ids for free.
#[derive(Debug, Clone, FromRow)]
pub struct DbAttendance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_code: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub notes: Option<String>,
    pub marked_by: Option<Uuid>,
    pub marked_by_name: Option<String>,
    pub owner_user_id: Uuid,
    pub owner_manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbAttendance> for Attendance {
    fn from(value: DbAttendance) -> Self {
        Attendance {
            id: value.id,
            employee_id: value.employee_id,
            employee_name: value.employee_name,
            employee_code: value.employee_code,
            date: value.date,
            status: value.status,
            check_in: value.check_in,
            check_out: value.check_out,
            notes: value.notes,
            marked_by: value.marked_by,
            marked_by_name: value.marked_by_name,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceCreateRequest {
    /// Ignored for plain users, whose records are pinned to their own
    /// profile.
    pub employee_id: Option<Uuid>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceUpdateRequest {
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub check_in: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub check_out: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AttendanceListQuery {
    pub employee_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}
