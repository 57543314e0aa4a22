use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable '{0}' is not set")]
    Missing(&'static str),

    #[error("Environment variable '{key}' has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
/// Startup is aborted if `GOOGLE_API_KEY` is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub ai_timeout: Duration,
    pub bulk_concurrency: usize,
    pub max_upload_bytes: usize,
    pub max_bulk_files: usize,
    pub session_ttl: Duration,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let google_api_key = require_env("GOOGLE_API_KEY")?;

        Ok(Config {
            google_api_key,
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: optional_env("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            ai_timeout: Duration::from_secs(parse_env("AI_TIMEOUT_SECS", 60)?),
            bulk_concurrency: parse_env::<usize>("BULK_CONCURRENCY", 3)?.max(1),
            max_upload_bytes: parse_env::<usize>("MAX_UPLOAD_MB", 10)? * 1024 * 1024,
            max_bulk_files: parse_env::<usize>("MAX_BULK_FILES", 20)?.max(1),
            session_ttl: Duration::from_secs(parse_env::<u64>("SESSION_TTL_MINUTES", 120)? * 60),
            host: optional_env("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_env("PORT", 8501)?,
        })
    }

    /// Request body cap for the bulk endpoint: one upload budget per allowed file.
    pub fn bulk_body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_mul(self.max_bulk_files)
    }
}

fn require_env(key: &'static str) -> Result<String, ConfigError> {
    optional_env(key).ok_or(ConfigError::Missing(key))
}

/// Unset and blank variables are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        None => Ok(default),
        Some(value) => parse_value(key, &value),
    }
}

fn parse_value<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
impl Config {
    /// Config with defaults and a dummy key, for handler and flow tests.
    pub fn for_tests() -> Self {
        Config {
            google_api_key: "test-key".to_string(),
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            ai_timeout: Duration::from_secs(5),
            bulk_concurrency: 2,
            max_upload_bytes: 1024 * 1024,
            max_bulk_files: 5,
            session_ttl: Duration::from_secs(60),
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_accepts_port() {
        let port: u16 = parse_value("PORT", "8080").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        let err = parse_value::<u16>("PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn test_missing_error_names_variable() {
        let err = ConfigError::Missing("GOOGLE_API_KEY");
        assert_eq!(
            err.to_string(),
            "Required environment variable 'GOOGLE_API_KEY' is not set"
        );
    }

    #[test]
    fn test_unset_or_blank_variable_is_missing() {
        const KEY: &str = "JOBFIT_TEST_REQUIRED_KEY";

        std::env::remove_var(KEY);
        assert!(matches!(require_env(KEY), Err(ConfigError::Missing(KEY))));

        std::env::set_var(KEY, "   ");
        assert_eq!(optional_env(KEY), None);
        assert!(matches!(require_env(KEY), Err(ConfigError::Missing(KEY))));
        assert_eq!(parse_env(KEY, 7u16).unwrap(), 7);

        std::env::set_var(KEY, " abc ");
        assert_eq!(require_env(KEY).unwrap(), "abc");
        std::env::remove_var(KEY);
    }

    #[test]
    fn test_bulk_body_limit_scales_with_file_count() {
        let config = Config::for_tests();
        assert_eq!(config.bulk_body_limit(), 5 * 1024 * 1024);
    }
}
