use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{
    attendance::{Attendance, AttendanceStatus},
    employee::Employee,
};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Blue,
    Green,
    Purple,
    Orange,
    Red,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Trend {
    /// Percent.
    pub value: u32,
    pub is_positive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatCard {
    pub title: String,
    pub value: String,
    pub color: CardColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

impl StatCard {
    fn new(title: &str, value: impl ToString, color: CardColor) -> Self {
        Self {
            title: title.to_string(),
            value: value.to_string(),
            color,
            trend: None,
        }
    }

    fn rising(mut self, percent: u32) -> Self {
        self.trend = Some(Trend {
            value: percent,
            is_positive: true,
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_employees: i64,
    pub total_departments: i64,
    pub present_today: i64,
    pub recent_hires: i64,
    /// Employee view only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_rate: Option<i64>,
}

/// Stats for one employee's own record and attendance history.
pub fn personal_stats(attendance: &[Attendance], today: NaiveDate) -> DashboardStats {
    let present = attendance
        .iter()
        .filter(|a| a.status == AttendanceStatus::Present)
        .count();
    let present_today = attendance
        .iter()
        .any(|a| a.date == today && a.status == AttendanceStatus::Present);

    DashboardStats {
        total_employees: 1,
        total_departments: 1,
        present_today: i64::from(present_today),
        recent_hires: 0,
        attendance_rate: Some(attendance_rate(present, attendance.len())),
    }
}

/// Whole percent of present days, 0 with no history.
pub fn attendance_rate(present: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    (present as f64 / total as f64 * 100.0).round() as i64
}

pub fn admin_cards(stats: &DashboardStats) -> Vec<StatCard> {
    vec![
        StatCard::new("Total Employees", stats.total_employees, CardColor::Blue).rising(12),
        StatCard::new("Departments", stats.total_departments, CardColor::Green),
        StatCard::new("Present Today", stats.present_today, CardColor::Purple).rising(5),
        StatCard::new("New Hires (30d)", stats.recent_hires, CardColor::Orange),
    ]
}

pub fn employee_cards(stats: &DashboardStats, own: Option<&Employee>) -> Vec<StatCard> {
    let department = own
        .and_then(|e| e.department.as_ref())
        .map(|d| d.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("N/A");
    let (present, color) = if stats.present_today > 0 {
        ("Yes", CardColor::Green)
    } else {
        ("No", CardColor::Red)
    };

    vec![
        StatCard::new("My Status", "Active", CardColor::Green),
        StatCard::new("Department", department, CardColor::Blue),
        StatCard::new("Present Today", present, color),
        StatCard::new(
            "Attendance Rate",
            format!("{}%", stats.attendance_rate.unwrap_or(0)),
            CardColor::Purple,
        ),
    ]
}
