// src/config.rs

use std::{env, net::SocketAddr};

use dotenvy::dotenv;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Outbound mail settings. Without an API key codes are only logged.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub resend_api_key: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub mail: MailConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://whisperbox.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration = match env::var("JWT_EXPIRATION") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "JWT_EXPIRATION",
                reason: e.to_string(),
            })?,
            Err(_) => 86_400,
        };

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let mail = MailConfig {
            resend_api_key: env::var("RESEND_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            from: env::var("MAIL_FROM").unwrap_or_else(|_| "onboarding@resend.dev".to_string()),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            cors_origins,
            mail,
        })
    }
}
