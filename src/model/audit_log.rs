use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateEmployee,
    UpdateEmployee,
    DeleteEmployee,
    CreateDepartment,
    UpdateDepartment,
    DeleteDepartment,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetType {
    Employee,
    Department,
}

/// Append-only record of an admin-initiated mutation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    pub id: String,
    pub admin_id: String,
    pub action: AuditAction,
    pub target_type: TargetType,
    pub target_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditLog {
    pub admin_id: String,
    pub action: AuditAction,
    pub target_type: TargetType,
    pub target_id: Option<String>,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditLogFilter {
    /// e.g. `DELETE_DEPARTMENT`
    #[param(value_type = Option<String>)]
    pub action: Option<AuditAction>,
    #[param(value_type = Option<String>)]
    pub target_type: Option<TargetType>,
    pub limit: Option<u32>,
}

impl AuditLogFilter {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 500;

    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn matches(&self, log: &AuditLog) -> bool {
        self.action.is_none_or(|action| log.action == action)
            && self.target_type.is_none_or(|target| log.target_type == target)
    }
}
