use axum::extract::State;
use axum::Json;
use sqlx::SqlitePool;

use crate::app::AppState;
use crate::authz::Actor;
use crate::errors::{AppError, AppResult};
use crate::models::settings::{
    OrganizationSettings, OrganizationSettingsUpdate, SystemPreferences, SystemPreferencesUpdate,
};
use crate::utils::utc_now;

const WORKING_DAYS: [&str; 4] = ["mon-fri", "mon-sat", "mon-sun", "custom"];
const THEME_MODES: [&str; 3] = ["light", "dark", "auto"];

#[utoipa::path(
    get,
    path = "/settings/organization",
    tag = "Settings",
    responses((status = 200, description = "Organization settings", body = OrganizationSettings)),
    security(("bearer_auth" = []))
)]
pub async fn get_organization(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<OrganizationSettings>> {
    actor.require_admin()?;
    let settings = fetch_organization(&state.pool).await?;
    Ok(Json(settings))
}

#[utoipa::path(
    put,
    path = "/settings/organization",
    tag = "Settings",
    request_body = OrganizationSettingsUpdate,
    responses((status = 200, description = "Organization settings updated", body = OrganizationSettings)),
    security(("bearer_auth" = []))
)]
pub async fn update_organization(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<OrganizationSettingsUpdate>,
) -> AppResult<Json<OrganizationSettings>> {
    actor.require_admin()?;
    let current = fetch_organization(&state.pool).await?;

    let working_days = match payload.working_days {
        Some(days) => {
            if !WORKING_DAYS.contains(&days.as_str()) {
                return Err(AppError::bad_request("invalid working_days value"));
            }
            days
        }
        None => current.working_days,
    };
    let working_days_per_month = match payload.working_days_per_month {
        Some(days) => {
            if !(1..=31).contains(&days) {
                return Err(AppError::bad_request("working_days_per_month must be between 1 and 31"));
            }
            days
        }
        None => current.working_days_per_month,
    };
    let organization_name = payload.organization_name.unwrap_or(current.organization_name);
    let company_address = payload.company_address.unwrap_or(current.company_address);
    let working_hours_start = payload.working_hours_start.unwrap_or(current.working_hours_start);
    let working_hours_end = payload.working_hours_end.unwrap_or(current.working_hours_end);
    let currency = payload.currency.unwrap_or(current.currency);
    let currency_symbol = payload.currency_symbol.unwrap_or(current.currency_symbol);

    sqlx::query(
        "UPDATE organization_settings SET organization_name = ?, company_address = ?, working_days = ?, \
         working_hours_start = ?, working_hours_end = ?, currency = ?, currency_symbol = ?, \
         working_days_per_month = ?, updated_at = ? WHERE id = 1",
    )
    .bind(&organization_name)
    .bind(&company_address)
    .bind(&working_days)
    .bind(&working_hours_start)
    .bind(&working_hours_end)
    .bind(&currency)
    .bind(&currency_symbol)
    .bind(working_days_per_month)
    .bind(utc_now())
    .execute(&state.pool)
    .await?;

    let settings = fetch_organization(&state.pool).await?;
    Ok(Json(settings))
}

#[utoipa::path(
    get,
    path = "/settings/preferences",
    tag = "Settings",
    responses((status = 200, description = "System preferences", body = SystemPreferences)),
    security(("bearer_auth" = []))
)]
pub async fn get_preferences(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<SystemPreferences>> {
    actor.require_admin()?;
    let preferences = fetch_preferences(&state.pool).await?;
    Ok(Json(preferences))
}

#[utoipa::path(
    put,
    path = "/settings/preferences",
    tag = "Settings",
    request_body = SystemPreferencesUpdate,
    responses((status = 200, description = "System preferences updated", body = SystemPreferences)),
    security(("bearer_auth" = []))
)]
pub async fn update_preferences(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<SystemPreferencesUpdate>,
) -> AppResult<Json<SystemPreferences>> {
    actor.require_admin()?;
    let current = fetch_preferences(&state.pool).await?;

    let theme_mode = match payload.theme_mode {
        Some(mode) => {
            if !THEME_MODES.contains(&mode.as_str()) {
                return Err(AppError::bad_request("invalid theme_mode value"));
            }
            mode
        }
        None => current.theme_mode,
    };
    let allow_self_registration = payload.allow_self_registration.unwrap_or(current.allow_self_registration);
    let session_timeout_minutes = payload.session_timeout_minutes.unwrap_or(current.session_timeout_minutes);
    let force_password_reset = payload.force_password_reset.unwrap_or(current.force_password_reset);
    let date_format = payload.date_format.unwrap_or(current.date_format);
    let timezone = payload.timezone.unwrap_or(current.timezone);
    let enable_notifications = payload.enable_notifications.unwrap_or(current.enable_notifications);

    sqlx::query(
        "UPDATE system_preferences SET allow_self_registration = ?, session_timeout_minutes = ?, \
         force_password_reset = ?, theme_mode = ?, date_format = ?, timezone = ?, \
         enable_notifications = ?, updated_at = ? WHERE id = 1",
    )
    .bind(allow_self_registration)
    .bind(session_timeout_minutes)
    .bind(force_password_reset)
    .bind(&theme_mode)
    .bind(&date_format)
    .bind(&timezone)
    .bind(enable_notifications)
    .bind(utc_now())
    .execute(&state.pool)
    .await?;

    let preferences = fetch_preferences(&state.pool).await?;
    Ok(Json(preferences))
}

async fn fetch_organization(pool: &SqlitePool) -> AppResult<OrganizationSettings> {
    let settings = sqlx::query_as::<_, OrganizationSettings>(
        "SELECT organization_name, company_address, working_days, working_hours_start, \
         working_hours_end, currency, currency_symbol, working_days_per_month, updated_at \
         FROM organization_settings WHERE id = 1",
    )
    .fetch_one(pool)
    .await?;
    Ok(settings)
}

async fn fetch_preferences(pool: &SqlitePool) -> AppResult<SystemPreferences> {
    let preferences = sqlx::query_as::<_, SystemPreferences>(
        "SELECT allow_self_registration, session_timeout_minutes, force_password_reset, \
         theme_mode, date_format, timezone, enable_notifications, updated_at \
         FROM system_preferences WHERE id = 1",
    )
    .fetch_one(pool)
    .await?;
    Ok(preferences)
}
