//! Shared fixtures for the handler tests.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::auth::auth::AuthUser;
use crate::auth::jwt::generate_access_token;
use crate::config::Config;
use crate::model::user::User;
use crate::store::memory::MemoryStore;

pub fn test_config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 1000,
        rate_refresh_per_min: 1000,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        default_employee_password: "password123".into(),
        log_dir: "logs".into(),
    }
}

pub fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// The rate limiter keys on the peer address, so every request needs one.
pub fn peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// `Authorization` header carrying an access token for `user`.
pub fn bearer(user: &User, employee_id: Option<&str>) -> (&'static str, String) {
    let auth_user = AuthUser {
        user_id: user.id.clone(),
        email: user.email.clone(),
        role: user.role,
        employee_id: employee_id.map(str::to_string),
    };
    let config = test_config();
    let token = generate_access_token(&auth_user, &config.jwt_secret, config.access_token_ttl)
        .expect("sign test token");
    ("Authorization", format!("Bearer {token}"))
}

/// Initialized app over `$store` (an `Arc<MemoryStore>`) with the real routes.
macro_rules! test_app {
    ($store:expr) => {{
        let store: std::sync::Arc<dyn $crate::store::Store> = $store.clone();
        let config = $crate::test_support::test_config();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from(store))
                .app_data(actix_web::web::Data::new(config.clone()))
                .configure(|cfg| $crate::routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

pub(crate) use test_app;
