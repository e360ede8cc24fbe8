use std::time::Duration;

use anyhow::{Context, Result};

/// Default Replicate model versions. Override per deployment when the
/// provider publishes a new version.
const DEFAULT_ENHANCE_VERSION: &str =
    "7de2ea26c616d5bf2245ad0d5e24f0ff9a6204578a5c876db53142edd9d2cd56";
const DEFAULT_HEADSHOT_VERSION: &str =
    "ddfc2b08d209f9fa8c1uj1bca788cfbd1c7bfc45f8c4a37aa9e1b4db7c1ed45";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
///
/// Provider credentials are optional: a missing `REPLICATE_API_TOKEN` puts
/// photo generation in degraded mode, a missing `ANTHROPIC_API_KEY` disables
/// the text endpoints.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: Option<String>,
    pub replicate_api_token: Option<String>,
    pub replicate_enhance_version: String,
    pub replicate_headshot_version: String,
    pub poll_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let poll_interval_ms = optional_env("POLL_INTERVAL_MS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("POLL_INTERVAL_MS must be a number of milliseconds")?
            .unwrap_or(2000);

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            replicate_api_token: optional_env("REPLICATE_API_TOKEN"),
            replicate_enhance_version: optional_env("REPLICATE_ENHANCE_VERSION")
                .unwrap_or_else(|| DEFAULT_ENHANCE_VERSION.to_string()),
            replicate_headshot_version: optional_env("REPLICATE_HEADSHOT_VERSION")
                .unwrap_or_else(|| DEFAULT_HEADSHOT_VERSION.to_string()),
            poll_interval: Duration::from_millis(poll_interval_ms),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads an optional variable. Blank values count as unset so that an empty
/// `REPLICATE_API_TOKEN=` line in `.env` still selects degraded mode.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
