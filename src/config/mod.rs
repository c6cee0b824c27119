use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Minimum signing secret length accepted by the production profile.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Default bearer token lifetime: one week.
pub const DEFAULT_JWT_EXPIRY_HOURS: u64 = 24 * 7;

/// Longest bearer token lifetime accepted from `JWT_EXPIRY_HOURS`: one year.
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-empty value")]
    MissingSecret,

    #[error("JWT_SECRET must be at least {0} bytes in production")]
    WeakSecret(usize),

    #[error("DATABASE_URL is required in the {0:?} environment")]
    MissingDatabaseUrl(Environment),

    #[error("DATABASE_URL is not a valid URL")]
    InvalidDatabaseUrl,

    #[error("SECURITY_CORS_ORIGINS is required in the {0:?} environment")]
    MissingCorsOrigins(Environment),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding the browser client (login.html, home.html, ...)
    pub static_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string; `None` selects the in-memory store
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    /// Allowed CORS origins; empty means permissive
    pub cors_origins: Vec<String>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Fails instead of falling back to defaults for anything security relevant:
    /// there is no built-in signing secret.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup (used by tests and tooling).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let secret = lookup("JWT_SECRET")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        // Set defaults based on environment, then override with specific env vars
        let mut config = match environment {
            Environment::Production => Self::production(secret),
            Environment::Staging => Self::staging(secret),
            Environment::Development => Self::development(secret),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("STUDY_DIARY_PORT") {
            self.server.port = parse_value("STUDY_DIARY_PORT", v)?;
        } else if let Some(v) = lookup("PORT") {
            self.server.port = parse_value("PORT", v)?;
        }
        if let Some(v) = lookup("STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(v)).filter(|p| !p.as_os_str().is_empty());
        }
        if let Some(v) = lookup("API_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = parse_value("API_REQUEST_TIMEOUT_SECS", v)?;
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_value("DATABASE_MAX_CONNECTIONS", v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse_value("DATABASE_CONNECTION_TIMEOUT", v)?;
        }

        // Security overrides are strict: a typo must not silently weaken auth
        if let Some(v) = lookup("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v
                .parse()
                .ok()
                .filter(|hours| (1..=MAX_JWT_EXPIRY_HOURS).contains(hours))
                .ok_or(ConfigError::InvalidValue { name: "JWT_EXPIRY_HOURS", value: v })?;
        }
        if let Some(v) = lookup("BCRYPT_COST") {
            self.security.bcrypt_cost = parse_value("BCRYPT_COST", v)?;
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production
            && self.security.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN
        {
            return Err(ConfigError::WeakSecret(MIN_PRODUCTION_SECRET_LEN));
        }

        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                name: "BCRYPT_COST",
                value: self.security.bcrypt_cost.to_string(),
            });
        }

        match &self.database.url {
            Some(raw) => {
                url::Url::parse(raw).map_err(|_| ConfigError::InvalidDatabaseUrl)?;
            }
            None if self.environment != Environment::Development => {
                return Err(ConfigError::MissingDatabaseUrl(self.environment));
            }
            None => {}
        }

        if self.environment != Environment::Development && self.security.cors_origins.is_empty() {
            return Err(ConfigError::MissingCorsOrigins(self.environment));
        }

        Ok(())
    }

    fn development(jwt_secret: String) -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 5000,
                static_dir: None,
                request_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret,
                jwt_expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
                bcrypt_cost: 10,
                cors_origins: Vec::new(),
            },
        }
    }

    fn staging(jwt_secret: String) -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 5000,
                static_dir: None,
                request_timeout_secs: 15,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                jwt_secret,
                jwt_expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
                bcrypt_cost: 12,
                cors_origins: Vec::new(),
            },
        }
    }

    fn production(jwt_secret: String) -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                static_dir: None,
                request_timeout_secs: 10,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret,
                jwt_expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
                bcrypt_cost: 12,
                cors_origins: Vec::new(),
            },
        }
    }
}

/// Numeric overrides are strict: a malformed value is an error, never a silent default.
fn parse_value<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}
