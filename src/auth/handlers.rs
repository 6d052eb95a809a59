use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::{AppError, read_failure},
    models::{Claims, LoginRequest, TokenPair, TokenType},
    store::Store,
};

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn token_failure(err: jsonwebtoken::errors::Error) -> AppError {
    error!(error = %err, "Failed to sign token");
    AppError::Internal("Error issuing token".to_string())
}

/// Issues an access token plus a persisted refresh token for `user`.
async fn issue_pair(
    user: &AuthUser,
    store: &dyn Store,
    config: &Config,
) -> Result<TokenPair, AppError> {
    let access_token =
        generate_access_token(user, &config.jwt_secret, config.access_token_ttl)
            .map_err(token_failure)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(user, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(token_failure)?;

    debug!(user_id = %user.user_id, jti = %refresh_claims.jti, "Storing refresh token");

    let expires_at = DateTime::<Utc>::from_timestamp(refresh_claims.exp as i64, 0)
        .unwrap_or_else(Utc::now);
    store
        .store_refresh_token(&user.user_id, &refresh_claims.jti, expires_at)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store refresh token");
            AppError::Internal("Error issuing token".to_string())
        })?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

fn refresh_claims(req: &HttpRequest, config: &Config) -> Option<Claims> {
    let claims = verify_token(bearer(req)?, &config.jwt_secret).ok()?;
    (claims.token_type == TokenType::Refresh).then_some(claims)
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
#[instrument(
    name = "auth_login",
    skip(store, config, body),
    fields(email = %body.email)
)]
pub async fn login(
    body: web::Json<LoginRequest>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    if body.email.trim().is_empty() || body.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::BadRequest("Email and password required".to_string()));
    }

    let user = match store
        .find_user_by_email(body.email.trim())
        .await
        .map_err(read_failure("signing in"))?
    {
        Some(user) => {
            debug!(user_id = %user.id, "User found");
            user
        }
        None => {
            info!("Invalid credentials: user not found");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    if let Err(e) = verify_password(&body.password, &user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let employee_id = store
        .find_employee_by_user(&user.id)
        .await
        .map_err(read_failure("signing in"))?
        .map(|e| e.id);

    let auth_user = AuthUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
        employee_id,
    };
    let pair = issue_pair(&auth_user, store.get_ref(), &config).await?;

    info!("Login successful");
    Ok(HttpResponse::Ok().json(pair))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Refresh token missing, expired or revoked")
    ),
    security(("bearer_auth" = []))
)]
#[instrument(name = "auth_refresh", skip_all)]
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let unauthorized = || AppError::Unauthorized("Invalid refresh token".to_string());

    let claims = refresh_claims(&req, &config).ok_or_else(unauthorized)?;

    // Revoking first means a token can be exchanged at most once.
    let revoked = store
        .revoke_refresh_token(&claims.jti)
        .await
        .map_err(read_failure("refreshing session"))?;
    if !revoked {
        info!(jti = %claims.jti, "Refresh token unknown or already used");
        return Err(unauthorized());
    }

    let pair = issue_pair(&AuthUser::from(claims), store.get_ref(), &config).await?;
    Ok(HttpResponse::Ok().json(pair))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 204, description = "Refresh token revoked if it was valid")),
    security(("bearer_auth" = []))
)]
#[instrument(name = "auth_logout", skip_all)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> HttpResponse {
    if let Some(claims) = refresh_claims(&req, &config) {
        if let Err(e) = store.revoke_refresh_token(&claims.jti).await {
            error!(error = %e, "Failed to revoke refresh token");
        }
    }

    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::json;

    use crate::auth::password::hash_password;
    use crate::model::role::Role;
    use crate::models::TokenPair;
    use crate::test_support::{peer, seeded_store, test_app};

    #[actix_web::test]
    async fn login_issues_tokens_for_valid_credentials() {
        let store = seeded_store();
        store.seed_user("boss@company.com", &hash_password("s3cret").unwrap(), Role::Admin);
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .peer_addr(peer())
            .set_json(json!({"email": "BOSS@company.com", "password": "s3cret"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let pair: TokenPair = test::read_body_json(resp).await;
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
    }

    #[actix_web::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let store = seeded_store();
        store.seed_user("boss@company.com", &hash_password("s3cret").unwrap(), Role::Admin);
        let app = test_app!(store);

        for (email, password) in [("boss@company.com", "nope"), ("ghost@company.com", "s3cret")] {
            let req = test::TestRequest::post()
                .uri("/auth/login")
                .peer_addr(peer())
                .set_json(json!({"email": email, "password": password}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "Invalid credentials");
        }
    }

    #[actix_web::test]
    async fn refresh_token_can_be_used_once() {
        let store = seeded_store();
        store.seed_user("boss@company.com", &hash_password("s3cret").unwrap(), Role::Admin);
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .peer_addr(peer())
            .set_json(json!({"email": "boss@company.com", "password": "s3cret"}))
            .to_request();
        let pair: TokenPair = test::call_and_read_body_json(&app, req).await;

        let refresh = |token: &str| {
            test::TestRequest::post()
                .uri("/auth/refresh")
                .peer_addr(peer())
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request()
        };

        let resp = test::call_service(&app, refresh(&pair.refresh_token)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let rotated: TokenPair = test::read_body_json(resp).await;
        assert_ne!(rotated.refresh_token, pair.refresh_token);

        let resp = test::call_service(&app, refresh(&pair.refresh_token)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        // Access tokens are not accepted in place of refresh tokens.
        let resp = test::call_service(&app, refresh(&rotated.access_token)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn logout_revokes_and_always_succeeds() {
        let store = seeded_store();
        store.seed_user("boss@company.com", &hash_password("s3cret").unwrap(), Role::Admin);
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .peer_addr(peer())
            .set_json(json!({"email": "boss@company.com", "password": "s3cret"}))
            .to_request();
        let pair: TokenPair = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/auth/logout")
            .peer_addr(peer())
            .insert_header(("Authorization", format!("Bearer {}", pair.refresh_token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::post()
            .uri("/auth/refresh")
            .peer_addr(peer())
            .insert_header(("Authorization", format!("Bearer {}", pair.refresh_token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/auth/logout")
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
    }
}
