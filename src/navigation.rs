//! Fixed route table of the dashboard front-end and the per-role sidebar.

use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Page {
    Dashboard,
    Employees,
    Departments,
}

pub const ROUTES: &[(&str, Page)] = &[
    ("/", Page::Dashboard),
    ("/employees", Page::Employees),
    ("/departments", Page::Departments),
    ("/profile", Page::Employees),
    ("/my-attendance", Page::Dashboard),
    ("/attendance", Page::Dashboard),
    ("/reports", Page::Dashboard),
    ("/notifications", Page::Dashboard),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Resolved {
    /// The path that is rendered, `/` after a redirect.
    pub path: String,
    pub page: Page,
    pub redirect: bool,
}

/// Maps a client path onto a page; unknown paths redirect to `/`.
pub fn resolve(path: &str) -> Resolved {
    let trimmed = path.trim();
    let normalized = match trimmed.trim_end_matches('/') {
        "" => "/",
        p => p,
    };

    match ROUTES.iter().find(|(route, _)| *route == normalized) {
        Some((route, page)) => Resolved {
            path: route.to_string(),
            page: *page,
            redirect: false,
        },
        None => Resolved {
            path: "/".to_string(),
            page: Page::Dashboard,
            redirect: true,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavLink {
    #[schema(value_type = String)]
    pub label: &'static str,
    #[schema(value_type = String)]
    pub path: &'static str,
}

const fn link(label: &'static str, path: &'static str) -> NavLink {
    NavLink { label, path }
}

const ADMIN_LINKS: [NavLink; 6] = [
    link("Dashboard", "/"),
    link("Employees", "/employees"),
    link("Departments", "/departments"),
    link("Attendance", "/attendance"),
    link("Reports", "/reports"),
    link("Notifications", "/notifications"),
];

const EMPLOYEE_LINKS: [NavLink; 4] = [
    link("Dashboard", "/"),
    link("My Profile", "/profile"),
    link("My Attendance", "/my-attendance"),
    link("Notifications", "/notifications"),
];

pub fn links_for(role: Role) -> &'static [NavLink] {
    match role {
        Role::Admin => &ADMIN_LINKS,
        Role::Employee => &EMPLOYEE_LINKS,
    }
}

pub fn portal_title(role: Role) -> &'static str {
    match role {
        Role::Admin => "Admin Panel",
        Role::Employee => "Employee Portal",
    }
}
