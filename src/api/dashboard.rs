use actix_web::{HttpResponse, web};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::{
    auth::auth::{AuthUser, Viewer},
    model::{
        attendance::{AttendanceFilter, AttendanceStatus},
        employee::Employee,
        role::Role,
    },
    store::{Store, StoreResult},
    view::dashboard::{DashboardStats, StatCard, admin_cards, employee_cards, personal_stats},
};

pub const RECENT_HIRE_DAYS: i64 = 30;
pub const RECENT_HIRE_LIMIT: i64 = 5;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub role: Role,
    pub stats: DashboardStats,
    pub cards: Vec<StatCard>,
    /// Recent hires for admins, the viewer's own record for employees.
    pub employees: Vec<Employee>,
}

/// Logs a failed read and falls back to `T::default()`.
fn or_default<T: Default>(result: StoreResult<T>, what: &'static str) -> T {
    result.unwrap_or_else(|e| {
        error!(error = %e, what, "Error fetching dashboard data");
        T::default()
    })
}

async fn admin_dashboard(store: &dyn Store, today: NaiveDate) -> DashboardResponse {
    let since = today - Duration::days(RECENT_HIRE_DAYS);

    let (employees, departments, present, recent) = futures::join!(
        store.count_employees(),
        store.count_departments(),
        store.count_attendance(today, AttendanceStatus::Present),
        store.recent_hires(since, RECENT_HIRE_LIMIT),
    );

    let recent = or_default(recent, "recent hires");
    let stats = DashboardStats {
        total_employees: or_default(employees, "employee count"),
        total_departments: or_default(departments, "department count"),
        present_today: or_default(present, "attendance count"),
        recent_hires: recent.len() as i64,
        attendance_rate: None,
    };

    DashboardResponse {
        role: Role::Admin,
        cards: admin_cards(&stats),
        stats,
        employees: recent,
    }
}

async fn employee_dashboard(store: &dyn Store, user: &AuthUser, today: NaiveDate) -> DashboardResponse {
    let own = or_default(store.find_employee_by_user(&user.user_id).await, "own record");

    let stats = match &own {
        Some(employee) => {
            let filter = AttendanceFilter {
                employee_id: Some(employee.id.clone()),
                date: None,
            };
            let history = or_default(store.list_attendance(&filter).await, "own attendance");
            personal_stats(&history, today)
        }
        None => DashboardStats::default(),
    };

    DashboardResponse {
        role: Role::Employee,
        cards: employee_cards(&stats, own.as_ref()),
        stats,
        employees: own.into_iter().collect(),
    }
}

/// Role-specific overview. Store failures degrade to zero values.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Stats, cards and recent or own employees", body = DashboardResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
pub async fn dashboard(viewer: Viewer, store: web::Data<dyn Store>) -> HttpResponse {
    let today = Utc::now().date_naive();

    let response = match &viewer {
        Viewer::Admin(_) => admin_dashboard(store.get_ref(), today).await,
        Viewer::Employee(user) => employee_dashboard(store.get_ref(), user, today).await,
    };

    HttpResponse::Ok().json(response)
}
