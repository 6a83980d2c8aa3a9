use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret_key: String,
    pub jwt_access_token_expires_days: i64,
    pub aws_bucket_name: String,
    pub aws_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Folder (key prefix) inside the bucket holding profile pictures.
    pub aws_upload_folder: String,
    pub aws_url_expire_seconds: u64,
    /// Custom S3 endpoint (MinIO, localstack). `None` talks to AWS.
    pub s3_endpoint: Option<String>,
    pub cookie_secure: bool,
    pub contract_logo_path: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret_key: require_env("JWT_SECRET_KEY")?,
            jwt_access_token_expires_days: parse_env("JWT_ACCESS_TOKEN_EXPIRES_DAYS", 1)?,
            aws_bucket_name: require_env("AWS_BUCKET_NAME")?,
            aws_region: optional_env("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            aws_upload_folder: optional_env("AWS_UPLOAD_FOLDER")
                .unwrap_or_else(|| "uploads".to_string()),
            aws_url_expire_seconds: parse_env("AWS_URL_EXPIRE_SECONDS", 3600)?,
            s3_endpoint: optional_env("S3_ENDPOINT"),
            cookie_secure: parse_env("COOKIE_SECURE", false)?,
            contract_logo_path: optional_env("CONTRACT_LOGO_PATH").map(PathBuf::from),
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
