use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::{AuthUser, Viewer},
    navigation::{self, NavLink, Resolved},
};

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: AuthUser,
    #[schema(example = "Admin Panel")]
    pub portal_title: String,
    pub navigation: Vec<NavLink>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NavigationQuery {
    /// Client path, e.g. `/employees`.
    pub path: String,
}

/// Who is signed in and which sidebar they get.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Current identity and navigation", body = SessionResponse)),
    tag = "Session",
    security(("bearer_auth" = []))
)]
pub async fn session(viewer: Viewer) -> HttpResponse {
    let role = viewer.role();

    HttpResponse::Ok().json(SessionResponse {
        portal_title: navigation::portal_title(role).to_string(),
        navigation: navigation::links_for(role).to_vec(),
        user: viewer.user().clone(),
    })
}

#[utoipa::path(
    get,
    path = "/api/navigation",
    params(NavigationQuery),
    responses((status = 200, description = "Page for the path; unknown paths redirect to /", body = Resolved)),
    tag = "Session",
    security(("bearer_auth" = []))
)]
pub async fn resolve_navigation(_viewer: Viewer, query: web::Query<NavigationQuery>) -> HttpResponse {
    HttpResponse::Ok().json(navigation::resolve(&query.path))
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use serde_json::Value;

    use crate::model::role::Role;
    use crate::test_support::{bearer, peer, seeded_store, test_app};

    #[actix_web::test]
    async fn session_reflects_role() {
        let store = seeded_store();
        let admin = store.seed_user("boss@company.com", "x", Role::Admin);
        let me = store.seed_user("ann@company.com", "x", Role::Employee);
        let app = test_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/session")
            .peer_addr(peer())
            .insert_header(bearer(&admin, None))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["portal_title"], "Admin Panel");
        assert_eq!(body["user"]["role"], "admin");
        assert_eq!(body["navigation"].as_array().unwrap().len(), 6);

        let req = test::TestRequest::get()
            .uri("/api/session")
            .peer_addr(peer())
            .insert_header(bearer(&me, Some("e-1")))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["portal_title"], "Employee Portal");
        assert_eq!(body["user"]["employee_id"], "e-1");
        assert_eq!(body["navigation"][2]["path"], "/my-attendance");
    }

    #[actix_web::test]
    async fn unknown_path_redirects_home() {
        let store = seeded_store();
        let me = store.seed_user("ann@company.com", "x", Role::Employee);
        let app = test_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/navigation?path=/payroll")
            .peer_addr(peer())
            .insert_header(bearer(&me, None))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["path"], "/");
        assert_eq!(body["page"], "dashboard");
        assert_eq!(body["redirect"], true);
    }
}
