use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::AppError;

/// The three-tier role hierarchy. Flat: a manager's direct reports never
/// bring their own sub-reports into scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

/// Authenticated identity for one request. `manager_id` is only meaningful
/// when `role` is [`Role::User`]; the engine ignores it otherwise.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub manager_id: Option<Uuid>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("admin access required"))
        }
    }
}

/// Resolves the bearer token to the current user row. Role and manager
/// assignment are read from storage at call time rather than trusted from
/// token claims, so a role change takes effect on the next request.
#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::unauthorized("Authorization header missing"))?;

        let claims = state.jwt.decode(token)?;

        let actor = sqlx::query_as::<_, (Uuid, Role, Option<Uuid>)>(
            "SELECT id, role, manager_id FROM users WHERE id = ?",
        )
        .bind(claims.sub)
        .fetch_optional(&state.pool)
        .await?
        .map(|(id, role, manager_id)| Actor { id, role, manager_id })
        .ok_or_else(|| AppError::unauthorized("account no longer exists"))?;

        Ok(actor)
    }
}
