use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    /// Remote resume scoring endpoint.
    pub scoring_url: String,
    pub scoring_timeout_secs: u64,
    /// Directory holding extracted-text sidecar files.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_files_per_upload: usize,
    pub session_ttl_secs: i64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// First administrator, created on startup when no user has that email yet.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret: require_env("JWT_SECRET")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            scoring_url: std::env::var("SCORING_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api/evaluate-cv".to_string()),
            scoring_timeout_secs: parse_env("SCORING_TIMEOUT_SECS", 60)?,
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads/cvs".to_string())
                .into(),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            max_files_per_upload: parse_env("MAX_FILES_PER_UPLOAD", 10)?,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", 3600)?,
            bootstrap_admin: bootstrap_admin_from_env(),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn bootstrap_admin_from_env() -> Option<BootstrapAdmin> {
    let email = std::env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?;
    let password = std::env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?;
    let name = std::env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());
    Some(BootstrapAdmin {
        email,
        password,
        name,
    })
}
