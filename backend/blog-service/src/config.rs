//! Configuration management for Blog Service
//!
//! Settings come from environment variables; in debug builds a `.env` file
//! is loaded first.
//!
//! # Example
//!
//! ```no_run
//! use blog_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("listening on {}", settings.server.bind_address());
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Context, Result};
use db_pool::DbConfig;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const SERVICE_NAME: &str = "blog-service";

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DbConfig,
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    pub roles: RoleSettings,
    pub security: SecuritySettings,
}

impl Settings {
    /// Load settings from the environment (and `.env` in debug builds)
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) && dotenvy::dotenv().is_ok() {
            info!("Loaded .env file for development");
        }

        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        Ok(Settings {
            server: ServerSettings::from_env()?,
            database: DbConfig::from_env(SERVICE_NAME).map_err(|e| anyhow!(e))?,
            redis: RedisSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            roles: RoleSettings::from_env()?,
            security: SecuritySettings::from_env()?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}", key)),
        Err(_) => Ok(default),
    }
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("SERVER_PORT", 8080)?,
            workers: parse_or("SERVER_WORKERS", 4)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Redis settings for the revocation store
#[derive(Clone)]
pub struct RedisSettings {
    pub url: String,
    pub command_timeout: Duration,
}

impl fmt::Debug for RedisSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSettings")
            .field("url", &"[REDACTED]")
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl RedisSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            command_timeout: Duration::from_millis(parse_or("REDIS_TIMEOUT_MS", 500u64)?),
        })
    }
}

/// Token signing settings
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub ttl_hours: i64,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"[REDACTED]")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let ttl_hours = parse_or("JWT_TTL_HOURS", crypto_core::jwt::DEFAULT_TOKEN_TTL_HOURS)?;
        if ttl_hours <= 0 {
            return Err(anyhow!("JWT_TTL_HOURS must be positive, got {}", ttl_hours));
        }

        Ok(Self { secret, ttl_hours })
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

/// Deployment-specific names of the two roles
#[derive(Debug, Clone)]
pub struct RoleSettings {
    pub admin: String,
    pub writer: String,
}

impl RoleSettings {
    fn from_env() -> Result<Self> {
        let admin = env::var("ADMIN_ROLE").unwrap_or_else(|_| "admin".to_string());
        let writer = env::var("WRITER_ROLE").unwrap_or_else(|_| "writer".to_string());
        Self::new(admin, writer)
    }

    pub fn new(admin: impl Into<String>, writer: impl Into<String>) -> Result<Self> {
        let admin = admin.into().trim().to_lowercase();
        let writer = writer.into().trim().to_lowercase();

        if admin.is_empty() || writer.is_empty() {
            return Err(anyhow!("ADMIN_ROLE and WRITER_ROLE must not be empty"));
        }
        if admin == writer {
            return Err(anyhow!(
                "ADMIN_ROLE and WRITER_ROLE must differ (both are '{}')",
                admin
            ));
        }

        Ok(Self { admin, writer })
    }
}

/// What to do when the revocation store cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevocationFailurePolicy {
    /// Reject the request
    #[default]
    Closed,
    /// Log and let the request through
    Open,
}

impl FromStr for RevocationFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closed" | "fail-closed" => Ok(Self::Closed),
            "open" | "fail-open" => Ok(Self::Open),
            other => Err(anyhow!(
                "unknown revocation failure policy '{}', expected 'closed' or 'open'",
                other
            )),
        }
    }
}

/// Password hashing cost and revocation policy
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
    pub revocation_failure_policy: RevocationFailurePolicy,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            revocation_failure_policy: RevocationFailurePolicy::Closed,
        }
    }
}

impl SecuritySettings {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let revocation_failure_policy = match env::var("REVOCATION_FAILURE_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.revocation_failure_policy,
        };

        Ok(Self {
            argon2_memory_kib: parse_or("ARGON2_MEMORY_KIB", defaults.argon2_memory_kib)?,
            argon2_iterations: parse_or("ARGON2_ITERATIONS", defaults.argon2_iterations)?,
            argon2_parallelism: parse_or("ARGON2_PARALLELISM", defaults.argon2_parallelism)?,
            revocation_failure_policy,
        })
    }
}
