use std::sync::Arc;

use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{attendance, auth, dashboard, employees, payroll, settings, tasks, teams, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let state = AppState::new(pool, jwt_config);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let user_routes = Router::new()
        .route("/", get(users::list_users))
        .route("/", post(users::create_user))
        .route("/:id", get(users::get_user))
        .route("/:id", put(users::update_user))
        .route("/:id", delete(users::delete_user))
        .route("/:id/reset-password", post(users::reset_password));

    let team_routes = Router::new()
        .route("/", get(teams::list_teams))
        .route("/", post(teams::create_team))
        .route("/:id", get(teams::get_team))
        .route("/:id", put(teams::update_team))
        .route("/:id", delete(teams::delete_team));

    let employee_routes = Router::new()
        .route("/", get(employees::list_employees))
        .route("/", post(employees::create_employee))
        .route("/:id", get(employees::get_employee))
        .route("/:id", put(employees::update_employee))
        .route("/:id", delete(employees::delete_employee));

    let attendance_routes = Router::new()
        .route("/", get(attendance::list_attendance))
        .route("/", post(attendance::create_attendance))
        .route("/:id", get(attendance::get_attendance))
        .route("/:id", put(attendance::update_attendance))
        .route("/:id", delete(attendance::delete_attendance));

    let payroll_routes = Router::new()
        .route("/", get(payroll::list_payroll))
        .route("/", post(payroll::create_payroll))
        .route("/:id", get(payroll::get_payroll))
        .route("/:id", put(payroll::update_payroll))
        .route("/:id", delete(payroll::delete_payroll));

    // /tasks/calendar must be registered before /tasks/:id matches it
    let task_routes = Router::new()
        .route("/", get(tasks::list_tasks))
        .route("/", post(tasks::create_task))
        .route("/calendar", get(tasks::calendar))
        .route("/:id", get(tasks::get_task))
        .route("/:id", put(tasks::update_task))
        .route("/:id", delete(tasks::delete_task));

    let settings_routes = Router::new()
        .route("/organization", get(settings::get_organization).put(settings::update_organization))
        .route("/preferences", get(settings::get_preferences).put(settings::update_preferences));

    let router = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/teams", team_routes)
        .nest("/employees", employee_routes)
        .nest("/attendance", attendance_routes)
        .nest("/payroll", payroll_routes)
        .nest("/tasks", task_routes)
        .nest("/settings", settings_routes)
        .route("/dashboard/stats", get(dashboard::stats))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
