use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::role::Role;
use crate::models::Claims;

/// Identity decoded from a valid access token.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.sub,
            role: claims.role,
            employee_id: claims.employee_id,
        }
    }
}

/// Which rows a viewer may read.
#[derive(Debug, Clone, PartialEq)]
pub enum DataScope {
    All,
    /// Only the employee row linked to this login, and its attendance.
    OwnRecord { user_id: String },
}

/// The authenticated caller, split by role so every handler has to decide
/// what each side sees.
#[derive(Debug, Clone, PartialEq)]
pub enum Viewer {
    Admin(AuthUser),
    Employee(AuthUser),
}

impl Viewer {
    pub fn from_user(user: AuthUser) -> Self {
        match user.role {
            Role::Admin => Viewer::Admin(user),
            Role::Employee => Viewer::Employee(user),
        }
    }

    pub fn user(&self) -> &AuthUser {
        match self {
            Viewer::Admin(user) | Viewer::Employee(user) => user,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Viewer::Admin(_) => Role::Admin,
            Viewer::Employee(_) => Role::Employee,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Viewer::Admin(_))
    }

    pub fn require_admin(&self) -> Result<&AuthUser, AppError> {
        match self {
            Viewer::Admin(user) => Ok(user),
            Viewer::Employee(_) => Err(AppError::Forbidden("Admin only".to_string())),
        }
    }

    pub fn scope(&self) -> DataScope {
        match self {
            Viewer::Admin(_) => DataScope::All,
            Viewer::Employee(user) => DataScope::OwnRecord {
                user_id: user.user_id.clone(),
            },
        }
    }
}

impl FromRequest for Viewer {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by auth_middleware for every route under the api scope.
        let user = req.extensions().get::<AuthUser>().cloned();
        ready(
            user.map(Viewer::from_user)
                .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string())),
        )
    }
}
