use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Password given to login accounts created alongside a new employee.
    pub default_employee_password: String,
    pub log_dir: String,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{key} is not a valid value"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET cannot be empty");
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret,
            access_token_ttl: or_default("ACCESS_TOKEN_TTL", "900")?, // 15 min
            refresh_token_ttl: or_default("REFRESH_TOKEN_TTL", "604800")?, // 7 days

            rate_login_per_min: or_default("RATE_LOGIN_PER_MIN", "60")?,
            rate_refresh_per_min: or_default("RATE_REFRESH_PER_MIN", "30")?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            default_employee_password: env::var("DEFAULT_EMPLOYEE_PASSWORD")
                .unwrap_or_else(|_| "password123".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}
