use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Credentials for the out-of-band operator console.
///
/// Tokens are validated against `token_secret` first and `previous_token_secret` second,
/// so the secret can be rotated without invalidating sessions issued a moment earlier.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub email: String,
    pub password_hash: String,
    pub token_secret: String,
    pub previous_token_secret: Option<String>,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub public_rps: u32,
    pub api_rps: u32,
    pub uploads_dir: String,
    pub public_base_url: String,
    pub log_format: LogFormat,
    pub operator: Option<OperatorConfig>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let log_format = match get_env_or("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            other => {
                return Err(Error::Config(format!(
                    "Invalid value for LOG_FORMAT: {}",
                    other
                )))
            }
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            session_ttl_hours: get_env_parse_or("SESSION_TTL_HOURS", 24)?,
            cookie_secure: get_env_parse_or("COOKIE_SECURE", false)?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            api_rps: get_env_parse("API_RPS")?,
            uploads_dir: get_env_or("UPLOADS_DIR", "./uploads"),
            public_base_url: get_env_or("PUBLIC_BASE_URL", "/uploads"),
            log_format,
            operator: operator_from_env()?,
        })
    }
}

fn operator_from_env() -> Result<Option<OperatorConfig>> {
    let email = env::var("OPERATOR_EMAIL").ok();
    let password_hash = env::var("OPERATOR_PASSWORD_HASH").ok();
    let token_secret = env::var("OPERATOR_TOKEN_SECRET").ok();

    match (email, password_hash, token_secret) {
        (Some(email), Some(password_hash), Some(token_secret)) => Ok(Some(OperatorConfig {
            email,
            password_hash,
            token_secret,
            previous_token_secret: env::var("OPERATOR_TOKEN_SECRET_PREVIOUS").ok(),
            token_ttl_minutes: get_env_parse_or("OPERATOR_TOKEN_TTL_MINUTES", 60)?,
        })),
        (None, None, None) => Ok(None),
        _ => Err(Error::Config(
            "OPERATOR_EMAIL, OPERATOR_PASSWORD_HASH and OPERATOR_TOKEN_SECRET must be set together"
                .to_string(),
        )),
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(_) => get_env_parse(name),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
