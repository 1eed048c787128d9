use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Singleton row (id = 1), admin-managed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrganizationSettings {
    pub organization_name: String,
    pub company_address: Option<String>,
    pub working_days: String,
    pub working_hours_start: String,
    pub working_hours_end: String,
    pub currency: String,
    pub currency_symbol: String,
    pub working_days_per_month: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrganizationSettingsUpdate {
    pub organization_name: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub company_address: Option<Option<String>>,
    /// One of `mon-fri`, `mon-sat`, `mon-sun`, `custom`.
    pub working_days: Option<String>,
    pub working_hours_start: Option<String>,
    pub working_hours_end: Option<String>,
    pub currency: Option<String>,
    pub currency_symbol: Option<String>,
    #[schema(minimum = 1, maximum = 31)]
    pub working_days_per_month: Option<i64>,
}

/// Singleton row (id = 1), admin-managed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SystemPreferences {
    pub allow_self_registration: bool,
    pub session_timeout_minutes: i64,
    pub force_password_reset: bool,
    pub theme_mode: String,
    pub date_format: String,
    pub timezone: String,
    pub enable_notifications: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SystemPreferencesUpdate {
    pub allow_self_registration: Option<bool>,
    pub session_timeout_minutes: Option<i64>,
    pub force_password_reset: Option<bool>,
    /// One of `light`, `dark`, `auto`.
    pub theme_mode: Option<String>,
    pub date_format: Option<String>,
    pub timezone: Option<String>,
    pub enable_notifications: Option<bool>,
}
