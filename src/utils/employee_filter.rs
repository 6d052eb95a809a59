use serde::Deserialize;
use utoipa::IntoParams;

use crate::model::employee::Employee;

/// Search box plus department dropdown of the employee list. Both predicates
/// must hold; an empty value matches everything.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeFilter {
    /// Case-insensitive substring of name, email or job title.
    pub search: Option<String>,
    /// Exact department id.
    pub department_id: Option<String>,
}

impl EmployeeFilter {
    pub fn matches(&self, employee: &Employee) -> bool {
        self.matches_search(employee) && self.matches_department(employee)
    }

    fn matches_search(&self, employee: &Employee) -> bool {
        let needle = match self.search.as_deref() {
            None | Some("") => return true,
            Some(search) => search.to_lowercase(),
        };

        employee.name.to_lowercase().contains(&needle)
            || employee.email.to_lowercase().contains(&needle)
            || employee
                .job_title
                .as_deref()
                .is_some_and(|title| title.to_lowercase().contains(&needle))
    }

    fn matches_department(&self, employee: &Employee) -> bool {
        match self.department_id.as_deref() {
            None | Some("") => true,
            Some(id) => employee.department_id.as_deref() == Some(id),
        }
    }

    /// Keeps the input order.
    pub fn apply(&self, employees: Vec<Employee>) -> Vec<Employee> {
        employees.into_iter().filter(|e| self.matches(e)).collect()
    }
}
