use crate::api::{
    attendance::AttendanceForm,
    dashboard::DashboardResponse,
    department::DepartmentForm,
    employee::{EmployeeDetailResponse, EmployeeForm, EmployeeListResponse},
    session::SessionResponse,
};
use crate::auth::auth::AuthUser;
use crate::model::{
    attendance::{Attendance, AttendanceStatus},
    audit_log::{AuditAction, AuditLog, TargetType},
    department::{Department, DepartmentRef, ManagerRef},
    employee::Employee,
    role::Role,
    user::UserRef,
};
use crate::models::{LoginRequest, TokenPair};
use crate::navigation::{NavLink, Page, Resolved};
use crate::view::{
    dashboard::{CardColor, DashboardStats, StatCard, Trend},
    employee::EmployeeDetails,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staff Desk API",
        version = "1.0.0",
        description = r#"
## Employee management dashboard

Backend of a small-company dashboard where admins manage employees,
departments and attendance, and employees see their own record.

### Key Features
- **Employees**: search, department filter, details, CSV export
- **Departments**: manager and head count
- **Dashboard**: role-specific stat cards
- **Audit log**: every admin change is recorded

### Security
All `/api` endpoints require a **JWT Bearer** access token from `/auth/login`.
Writes are limited to the **admin** role.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::session::session,
        crate::api::session::resolve_navigation,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::export_employees,

        crate::api::department::list_departments,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::dashboard::dashboard,

        crate::api::attendance::list_attendance,
        crate::api::attendance::record_attendance,

        crate::api::audit_log::list_audit_logs
    ),
    components(
        schemas(
            LoginRequest,
            TokenPair,
            AuthUser,
            Role,
            UserRef,
            SessionResponse,
            NavLink,
            Page,
            Resolved,
            Employee,
            EmployeeForm,
            EmployeeListResponse,
            EmployeeDetailResponse,
            EmployeeDetails,
            Department,
            DepartmentRef,
            ManagerRef,
            DepartmentForm,
            DashboardResponse,
            DashboardStats,
            StatCard,
            Trend,
            CardColor,
            Attendance,
            AttendanceStatus,
            AttendanceForm,
            AuditLog,
            AuditAction,
            TargetType
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Session", description = "Current identity and navigation"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "Dashboard", description = "Role-specific overview"),
        (name = "Attendance", description = "Attendance records"),
        (name = "Audit", description = "Admin change history"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_with_bearer_auth() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/api/employees",
            "/api/employees/{employee_id}",
            "/api/employees/export",
            "/api/departments/{department_id}",
            "/api/dashboard",
            "/api/audit-logs",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
