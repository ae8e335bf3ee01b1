use std::env;
use std::time::Duration;

use crate::error::{ApiError, Result};

const MIN_SECRET_LEN: usize = 32;
const DEFAULT_TOKEN_TTL_HOURS: u64 = 4;

/// Runtime configuration, resolved once at startup and handed to component
/// constructors. Nothing below reads the environment after this point.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
    pub mongodb_uri: String,
    pub database_name: String,
    pub token_secret: String,
    pub token_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let token_secret = env::var("JWT_SECRET_KEY").map_err(|_| {
            ApiError::Config("JWT_SECRET_KEY must be set".to_string())
        })?;

        if token_secret.len() < MIN_SECRET_LEN {
            return Err(ApiError::Config(format!(
                "JWT_SECRET_KEY must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        let port = match env::var("SERVER_PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                ApiError::Config(format!("SERVER_PORT is not a valid port: {}", raw))
            })?,
            Err(_) => 8080,
        };

        let token_ttl_hours = match env::var("TOKEN_TTL_HOURS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                ApiError::Config(format!("TOKEN_TTL_HOURS is not a number: {}", raw))
            })?,
            Err(_) => DEFAULT_TOKEN_TTL_HOURS,
        };

        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            mongodb_uri: env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "bookstore".to_string()),
            token_secret,
            token_ttl: Duration::from_secs(token_ttl_hours * 3600),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn clear_env() {
        for key in [
            "JWT_SECRET_KEY",
            "SERVER_HOST",
            "SERVER_PORT",
            "APP_ENV",
            "MONGODB_URI",
            "DATABASE_NAME",
            "TOKEN_TTL_HOURS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_with_secret_present() {
        clear_env();
        env::set_var("JWT_SECRET_KEY", SECRET);

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.env, "development");
        assert_eq!(config.database_name, "bookstore");
        assert_eq!(config.token_ttl, Duration::from_secs(4 * 3600));
    }

    #[test]
    #[serial]
    fn missing_secret_is_rejected() {
        clear_env();
        assert!(AppConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn short_secret_is_rejected() {
        clear_env();
        env::set_var("JWT_SECRET_KEY", "too-short");
        assert!(AppConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn invalid_port_is_rejected() {
        clear_env();
        env::set_var("JWT_SECRET_KEY", SECRET);
        env::set_var("SERVER_PORT", "not-a-port");
        assert!(AppConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn overrides_are_read() {
        clear_env();
        env::set_var("JWT_SECRET_KEY", SECRET);
        env::set_var("SERVER_PORT", "9000");
        env::set_var("APP_ENV", "production");
        env::set_var("TOKEN_TTL_HOURS", "1");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.port, 9000);
        assert_eq!(config.env, "production");
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        clear_env();
    }
}
