//! Configuration management
//!
//! Configuration is loaded from an optional `config.yml` file and then
//! overridden by environment variables (a `.env` file is honoured through
//! `dotenvy`). Missing values are filled with development defaults.

use serde::{Deserialize, Serialize};

/// Signing secret used when none is configured outside production.
pub const DEVELOPMENT_JWT_SECRET: &str = "super-secret-development-key";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Runtime environment
    #[serde(default)]
    pub environment: Environment,
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "test" => Some(Self::Test),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; `*` allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Pool size; each driver picks its own default when unset
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
            max_connections: None,
        }
    }
}

fn default_database_url() -> String {
    "data/qss.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Lifetime of an issued access token
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
    /// Lifetime of a session row
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_minutes: default_token_ttl_minutes(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

/// Upper bound for `token_ttl_minutes` (one year)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;
/// Upper bound for `session_ttl_hours` (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 365 * 24;

fn default_token_ttl_minutes() -> i64 {
    60
}

fn default_session_ttl_hours() -> i64 {
    24
}

impl AuthConfig {
    /// The configured secret, or the development fallback.
    pub fn secret_or_default(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or(DEVELOPMENT_JWT_SECRET)
    }

    /// Whether the development fallback secret is in use
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret.is_none()
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the defaults.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })
    }

    /// Load configuration from file, then apply environment overrides and validate
    ///
    /// Recognised variables: `APP_ENV`, `HOST`, `PORT`, `CORS_ALLOWED_ORIGINS`,
    /// `DATABASE_DRIVER`, `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`, `JWT_SECRET`,
    /// `TOKEN_TTL_MINUTES`, `SESSION_TTL_HOURS`.
    pub fn load_with_env(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load the dotenv file matching `APP_ENV` into the process environment.
    ///
    /// Returns the file name that was read, if any.
    pub fn load_dotenv() -> Option<&'static str> {
        let file = match std::env::var("APP_ENV").ok().as_deref().and_then(Environment::parse) {
            Some(Environment::Test) => ".env.test",
            _ => ".env",
        };
        dotenvy::from_filename(file).ok().map(|_| file)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(env) = std::env::var("APP_ENV").ok().as_deref().and_then(Environment::parse) {
            self.environment = env;
        }

        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
            self.server.cors_allowed_origins = parse_origins(&origins);
        }

        if let Ok(driver) = std::env::var("DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if url.starts_with("mysql://") {
                self.database.driver = DatabaseDriver::Mysql;
            }
            self.database.url = url;
        }
        if let Ok(max) = std::env::var("DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                self.database.max_connections = Some(max);
            }
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                self.auth.jwt_secret = Some(secret);
            }
        }
        if let Ok(ttl) = std::env::var("TOKEN_TTL_MINUTES") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                self.auth.token_ttl_minutes = ttl;
            }
        }
        if let Ok(ttl) = std::env::var("SESSION_TTL_HOURS") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                self.auth.session_ttl_hours = ttl;
            }
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production && self.auth.uses_default_secret() {
            return Err(ConfigError::ValidationError(
                "Missing required environment variable: JWT_SECRET".to_string(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Missing required environment variable: DATABASE_URL".to_string(),
            ));
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.auth.token_ttl_minutes) {
            return Err(ConfigError::ValidationError(format!(
                "Token lifetime must be between 1 and {} minutes",
                MAX_TOKEN_TTL_MINUTES
            )));
        }
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            return Err(ConfigError::ValidationError(format!(
                "Session lifetime must be between 1 and {} hours",
                MAX_SESSION_TTL_HOURS
            )));
        }
        Ok(())
    }
}

/// Split a comma separated origin list; an empty list means any origin.
pub fn parse_origins(value: &str) -> Vec<String> {
    let origins: Vec<String> = value
        .split(',')
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect();

    if origins.is_empty() {
        default_cors_origins()
    } else {
        origins
    }
}

fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
