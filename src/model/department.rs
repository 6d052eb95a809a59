use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "0d6f1a9e-3b7c-4e21-8a55-6c2d9f0e1b77",
    "name": "Engineering",
    "manager_id": null,
    "created_at": "2026-01-01T09:00:00Z",
    "employee_count": 12
}))]
pub struct Department {
    pub id: String,
    pub name: String,
    pub manager_id: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<ManagerRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ManagerRef {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Department summary joined onto an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DepartmentRef {
    pub id: String,
    pub name: String,
}

/// Column values written by a create or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentFields {
    pub name: String,
    pub manager_id: Option<String>,
}

impl DepartmentFields {
    pub const COLUMNS: [&'static str; 2] = ["name", "manager_id"];
}
