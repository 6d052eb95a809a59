use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{department::DepartmentRef, user::UserRef};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "9a7c1e22-5d0b-4f3e-b6a1-3c8d2e7f9a10",
        "user_id": "6b1f3c2e-8f0a-4c55-9d7e-2f1a0b9c4d11",
        "name": "Jane Doe",
        "email": "jane.doe@company.com",
        "phone": "+1 555 0100",
        "department_id": "0d6f1a9e-3b7c-4e21-8a55-6c2d9f0e1b77",
        "job_title": "Engineer",
        "salary": 75000.0,
        "date_of_joining": "2026-01-01",
        "created_at": "2026-01-01T09:00:00Z",
        "department": { "id": "0d6f1a9e-3b7c-4e21-8a55-6c2d9f0e1b77", "name": "Engineering" }
    })
)]
pub struct Employee {
    pub id: String,

    /// Login account, absent for employees without dashboard access.
    pub user_id: Option<String>,

    pub name: String,

    pub email: String,

    pub phone: Option<String>,

    pub department_id: Option<String>,

    pub job_title: Option<String>,

    pub salary: Option<f64>,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub date_of_joining: NaiveDate,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
}

/// Column values written by a create or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeFields {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department_id: Option<String>,
    pub job_title: Option<String>,
    pub salary: Option<f64>,
    pub date_of_joining: NaiveDate,
}

impl EmployeeFields {
    pub const COLUMNS: [&'static str; 7] = [
        "name",
        "email",
        "phone",
        "department_id",
        "job_title",
        "salary",
        "date_of_joining",
    ];
}
