use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub mailer_webhook_url: String,
    pub mailer_secret: String,
    pub webapp_url: String,
    pub reminder_lookahead_hours: i64,
    pub sweep_interval_secs: u64,
    pub confirmation_token_ttl_hours: i64,
    pub mailer_timeout_secs: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            mailer_webhook_url: get_env("MAILER_WEBHOOK_URL")?,
            mailer_secret: get_env("MAILER_SECRET")?,
            webapp_url: get_env("WEBAPP_URL")?,
            reminder_lookahead_hours: get_env_parse_or("REMINDER_LOOKAHEAD_HOURS", 2)?,
            sweep_interval_secs: get_env_parse_or("SWEEP_INTERVAL_SECS", 60)?,
            confirmation_token_ttl_hours: get_env_parse_or("CONFIRMATION_TOKEN_TTL_HOURS", 48)?,
            mailer_timeout_secs: get_env_parse_or("MAILER_TIMEOUT_SECS", 10)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
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
