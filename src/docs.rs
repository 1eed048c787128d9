use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::Role;
use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::signup,
        routes::auth::login,
        routes::auth::me,
        routes::users::list_users,
        routes::users::create_user,
        routes::users::get_user,
        routes::users::update_user,
        routes::users::delete_user,
        routes::users::reset_password,
        routes::teams::list_teams,
        routes::teams::create_team,
        routes::teams::get_team,
        routes::teams::update_team,
        routes::teams::delete_team,
        routes::employees::list_employees,
        routes::employees::create_employee,
        routes::employees::get_employee,
        routes::employees::update_employee,
        routes::employees::delete_employee,
        routes::attendance::list_attendance,
        routes::attendance::create_attendance,
        routes::attendance::get_attendance,
        routes::attendance::update_attendance,
        routes::attendance::delete_attendance,
        routes::payroll::list_payroll,
        routes::payroll::create_payroll,
        routes::payroll::get_payroll,
        routes::payroll::update_payroll,
        routes::payroll::delete_payroll,
        routes::tasks::list_tasks,
        routes::tasks::calendar,
        routes::tasks::create_task,
        routes::tasks::get_task,
        routes::tasks::update_task,
        routes::tasks::delete_task,
        routes::dashboard::stats,
        routes::settings::get_organization,
        routes::settings::update_organization,
        routes::settings::get_preferences,
        routes::settings::update_preferences,
    ),
    components(
        schemas(
            Role,
            models::user::User,
            models::user::AuthResponse,
            models::user::LoginRequest,
            models::user::RegisterRequest,
            models::user::UserCreateRequest,
            models::user::UserUpdateRequest,
            models::user::ResetPasswordRequest,
            models::team::Team,
            models::team::TeamCreateRequest,
            models::team::TeamUpdateRequest,
            models::employee::Employee,
            models::employee::EmployeeStatus,
            models::employee::EmployeeCreateRequest,
            models::employee::EmployeeUpdateRequest,
            models::attendance::Attendance,
            models::attendance::AttendanceStatus,
            models::attendance::AttendanceCreateRequest,
            models::attendance::AttendanceUpdateRequest,
            models::payroll::Payroll,
            models::payroll::PayrollStatus,
            models::payroll::PayrollCreateRequest,
            models::payroll::PayrollUpdateRequest,
            models::task::Task,
            models::task::TaskStatus,
            models::task::TaskCreateRequest,
            models::task::TaskUpdateRequest,
            models::task::TaskStatusUpdateRequest,
            models::settings::OrganizationSettings,
            models::settings::OrganizationSettingsUpdate,
            models::settings::SystemPreferences,
            models::settings::SystemPreferencesUpdate,
            routes::dashboard::DashboardStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Authentication"),
        (name = "Users", description = "User administration"),
        (name = "Teams", description = "Team management"),
        (name = "Employees", description = "Employee profiles"),
        (name = "Attendance", description = "Attendance tracking"),
        (name = "Payroll", description = "Payroll records"),
        (name = "Tasks", description = "Task management"),
        (name = "Dashboard", description = "Role-scoped statistics"),
        (name = "Settings", description = "Organization settings and preferences")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_routes() -> Router {
    let config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
        .try_it_out_enabled(true)
        .persist_authorization(true);

    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(config)
        .into()
}
