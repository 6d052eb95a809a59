use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::models::{Claims, TokenType};

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

fn issue(user: &AuthUser, token_type: TokenType, secret: &str, ttl: usize) -> Result<(String, Claims), Error> {
    let claims = Claims {
        user_id: user.user_id.clone(),
        sub: user.email.clone(),
        role: user.role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
        employee_id: user.employee_id.clone(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn generate_access_token(user: &AuthUser, secret: &str, ttl: usize) -> Result<String, Error> {
    issue(user, TokenType::Access, secret, ttl).map(|(token, _)| token)
}

/// The claims are returned so the caller can persist the `jti`.
pub fn generate_refresh_token(
    user: &AuthUser,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    issue(user, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
