//! Application configuration loaded from environment variables.

use crate::errors::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Where unauthenticated callers are sent to sign in
    pub login_url: String,
    /// Maximum number of pooled SQLite connections
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./bouwdepot.db".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid API_PORT".to_string()))?,
            login_url: env_var("LOGIN_URL").unwrap_or_else(|_| "/login".to_string()),
            max_connections: env_var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<u32>()
                .map_err(|_| ApiError::Config("Invalid DB_MAX_CONNECTIONS".to_string()))
                .and_then(|n| {
                    if n == 0 {
                        Err(ApiError::Config(
                            "DB_MAX_CONNECTIONS must be at least 1".to_string(),
                        ))
                    } else {
                        Ok(n)
                    }
                })?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ApiError::Config(format!("Missing env var: {key}")))
}
