use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("environment variable {key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// How outgoing mail is delivered
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MailProvider {
    /// Only writes the message to the log
    Log,
    /// Posts the message to a JSON mail API
    Http,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub provider: MailProvider,
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expires_in_hours: i64,
    pub frontend_url: String,
    pub port: u16,
    pub api_prefix: String,
    pub mail: MailConfig,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Reads the configuration from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = match optional("MAIL_PROVIDER").as_deref() {
            None | Some("log") => MailProvider::Log,
            Some("http") => MailProvider::Http,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "MAIL_PROVIDER",
                    value: other.to_string(),
                })
            }
        };

        let mail = MailConfig {
            provider,
            api_url: optional("MAIL_API_URL")
                .unwrap_or_else(|| "https://api.resend.com/emails".to_string()),
            api_key: optional("MAIL_API_KEY").unwrap_or_default(),
            from: optional("MAIL_FROM").unwrap_or_else(|| "noreply@example.com".to_string()),
        };
        if mail.provider == MailProvider::Http && mail.api_key.is_empty() {
            return Err(ConfigError::Missing("MAIL_API_KEY"));
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 20)?,
            jwt_secret: required("JWT_SECRET_KEY")?,
            jwt_expires_in_hours: parsed("JWT_EXPIRES_IN_HOURS", 24)?,
            frontend_url: optional("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            port: parsed("PORT", 3000)?,
            api_prefix: normalize_prefix(
                &optional("API_PREFIX").unwrap_or_else(|| "/v1/api".to_string()),
            ),
            mail,
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// "v1/api/" -> "/v1/api"
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
