//! Application configuration module
//!
//! Provides the runtime configuration for the server. Values come from the
//! environment (optionally seeded by a `.env` file) through
//! [`AppConfig::from_env`], or are assembled explicitly with
//! [`AppConfig::builder`] in tests.
//!
//! | Variable         | Default                          |
//! |------------------|----------------------------------|
//! | `BIND_ADDR`      | `0.0.0.0`                        |
//! | `SERVER_PORT`    | `5000`                           |
//! | `DATABASE_URL`   | `sqlite://storyloom.db?mode=rwc` |
//! | `JWT_SECRET`     | development secret (warned)      |
//! | `TOKEN_TTL_DAYS` | `7`                              |
//! | `BCRYPT_COST`    | `12`                             |
//! | `STATIC_DIR`     | `public`                         |
//! | `AI_API_URL`     | unset                            |
//! | `AI_API_KEY`     | unset                            |
//! | `AI_MODEL`       | `gpt-4o-mini`                    |

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://storyloom.db?mode=rwc";
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;
pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
const DEV_JWT_SECRET: &str = "storyloom-development-secret";

/// Settings for the optional story-continuation endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    /// Chat-completions URL of an OpenAI-compatible API
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub static_dir: String,
    pub ai: Option<AiConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            static_dir: "public".to_string(),
            ai: None,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup
    ///
    /// Unset and empty values both fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(addr) = get("BIND_ADDR") {
            let addr = addr
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BIND_ADDR", addr))?;
            builder = builder.bind_addr(addr);
        }
        if let Some(port) = get("SERVER_PORT") {
            let port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT", port))?;
            builder = builder.port(port);
        }
        if let Some(url) = get("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        match get("JWT_SECRET") {
            Some(secret) => builder = builder.jwt_secret(secret),
            None => tracing::warn!("JWT_SECRET not set, using the development secret"),
        }
        if let Some(ttl) = get("TOKEN_TTL_DAYS") {
            let ttl = ttl
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TOKEN_TTL_DAYS", ttl))?;
            builder = builder.token_ttl_days(ttl);
        }
        if let Some(cost) = get("BCRYPT_COST") {
            let cost = cost
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BCRYPT_COST", cost))?;
            builder = builder.bcrypt_cost(cost);
        }
        if let Some(dir) = get("STATIC_DIR") {
            builder = builder.static_dir(dir);
        }
        if let (Some(api_url), Some(api_key)) = (get("AI_API_URL"), get("AI_API_KEY")) {
            builder = builder.ai(AiConfig {
                api_url,
                api_key,
                model: get("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            });
        }

        builder.build()
    }

    /// Socket address the HTTP server binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingValue("DATABASE_URL"));
        }
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if self.token_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_DAYS",
                self.token_ttl_days.to_string(),
            ));
        }
        // bcrypt accepts costs 4 through 31
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue("BCRYPT_COST", self.bcrypt_cost.to_string()));
        }
        if let Some(ai) = &self.ai {
            if !(ai.api_url.starts_with("http://") || ai.api_url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(ai.api_url.clone()));
            }
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn bind_addr(mut self, addr: IpAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    pub fn token_ttl_days(mut self, days: i64) -> Self {
        self.config.token_ttl_days = days;
        self
    }

    pub fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.config.bcrypt_cost = cost;
        self
    }

    pub fn static_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.static_dir = dir.into();
        self
    }

    pub fn ai(mut self, ai: AiConfig) -> Self {
        self.config.ai = Some(ai);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
