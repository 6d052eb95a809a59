use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{employee::Employee, role::Role};
use crate::view::format::{format_currency, format_date, initials};

const NOT_ASSIGNED: &str = "Not assigned";
const NOT_SPECIFIED: &str = "Not specified";

/// Display-ready fields for the employee profile card.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeeDetails {
    pub name: String,
    pub initials: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub job_title: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[schema(example = "1/5/2026")]
    pub date_joined: String,
    pub created: String,
    #[schema(example = "9a7c1e22...")]
    pub short_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_role: Option<Role>,
}

impl From<&Employee> for EmployeeDetails {
    fn from(employee: &Employee) -> Self {
        let short_id: String = employee.id.chars().take(8).collect();

        Self {
            name: employee.name.clone(),
            initials: initials(&employee.name),
            email: employee.email.clone(),
            phone: employee.phone.clone().filter(|p| !p.is_empty()),
            job_title: employee
                .job_title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            department: employee
                .department
                .as_ref()
                .map(|d| d.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| NOT_ASSIGNED.to_string()),
            // A zero salary is hidden like a missing one.
            salary: employee
                .salary
                .filter(|s| *s != 0.0)
                .map(format_currency),
            date_joined: format_date(employee.date_of_joining),
            created: format_date(employee.created_at.date_naive()),
            short_id: format!("{short_id}..."),
            status: "Active".to_string(),
            login_role: employee.user.as_ref().map(|u| u.role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::department::DepartmentRef;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn employee() -> Employee {
        Employee {
            id: "9a7c1e22-5d0b-4f3e-b6a1-3c8d2e7f9a10".into(),
            user_id: None,
            name: "jane doe".into(),
            email: "jane@company.com".into(),
            phone: None,
            department_id: None,
            job_title: None,
            salary: None,
            date_of_joining: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap(),
            department: None,
            user: None,
        }
    }

    #[test]
    fn missing_fields_fall_back() {
        let details = EmployeeDetails::from(&employee());
        assert_eq!(details.initials, "J");
        assert_eq!(details.job_title, "Not specified");
        assert_eq!(details.department, "Not assigned");
        assert_eq!(details.phone, None);
        assert_eq!(details.salary, None);
        assert_eq!(details.date_joined, "1/5/2026");
        assert_eq!(details.created, "1/6/2026");
        assert_eq!(details.short_id, "9a7c1e22...");
        assert_eq!(details.login_role, None);
    }

    #[test]
    fn present_fields_are_formatted() {
        let mut employee = employee();
        employee.salary = Some(75000.0);
        employee.phone = Some("+1 555 0100".into());
        employee.job_title = Some("Engineer".into());
        employee.department = Some(DepartmentRef {
            id: "d-1".into(),
            name: "Engineering".into(),
        });

        let details = EmployeeDetails::from(&employee);
        assert_eq!(details.salary.as_deref(), Some("$75,000"));
        assert_eq!(details.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(details.department, "Engineering");

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["status"], "Active");
        assert!(json.get("login_role").is_none());
    }
}
