use anyhow::Result;
use csv::{Terminator, WriterBuilder};

use crate::model::employee::Employee;

pub const HEADER: [&str; 6] = [
    "Name",
    "Email",
    "Department",
    "Job Title",
    "Salary",
    "Date of Joining",
];

fn needs_formula_guard(value: &str) -> bool {
    matches!(value.chars().next(), Some('=' | '+' | '-' | '@'))
}

/// Spreadsheets evaluate cells starting with these characters.
fn guard(value: &str) -> String {
    if needs_formula_guard(value) {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

fn row(employee: &Employee) -> [String; 6] {
    [
        guard(&employee.name),
        guard(&employee.email),
        guard(
            employee
                .department
                .as_ref()
                .map(|d| d.name.as_str())
                .unwrap_or_default(),
        ),
        guard(employee.job_title.as_deref().unwrap_or_default()),
        employee
            .salary
            .filter(|s| *s != 0.0)
            .map(|s| s.to_string())
            .unwrap_or_default(),
        employee.date_of_joining.to_string(),
    ]
}

/// Header plus one line per employee, in the given order.
pub fn employees_to_csv(employees: &[Employee]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for employee in employees {
        writer.write_record(row(employee))?;
    }

    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn guards_formula_cells() {
        assert_eq!(guard("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(guard("@cmd"), "'@cmd");
        assert_eq!(guard("Jane"), "Jane");
        assert_eq!(guard(""), "");
    }

    #[test]
    fn quotes_embedded_commas() {
        let employee = Employee {
            id: "e-1".into(),
            user_id: None,
            name: "Doe, Jane".into(),
            email: "jane@company.com".into(),
            phone: None,
            department_id: None,
            job_title: None,
            salary: Some(1234.5),
            date_of_joining: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            created_at: Utc::now(),
            department: None,
            user: None,
        };
        let csv = employees_to_csv(&[employee]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Name,Email,Department,Job Title,Salary,Date of Joining");
        assert_eq!(lines[1], "\"Doe, Jane\",jane@company.com,,,1234.5,2026-01-05");
    }
}
