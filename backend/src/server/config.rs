//! Server configuration: environment parsing and the wiring bundle.

use std::net::SocketAddr;

use actix_web::cookie::Key;
use mockable::Env;

use crate::outbound::persistence::DbPool;

/// Environment variable naming the bind address.
pub const BIND_ADDR_ENV: &str = "BIND_ADDR";
/// Environment variable naming the PostgreSQL URL.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable toggling the `Secure` cookie attribute.
pub const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Failures while reading settings from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable was present but unparseable.
    #[error("environment variable {name} is invalid: {message}")]
    InvalidEnv {
        /// The offending variable.
        name: &'static str,
        /// Why it was rejected.
        message: String,
    },
}

/// Settings parsed from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// PostgreSQL URL; absent means fixture adapters (development only).
    pub database_url: Option<String>,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
}

/// Read settings from the given environment.
pub fn settings_from_env<E: Env>(env: &E) -> Result<AppSettings, ConfigError> {
    let bind_addr = env
        .string(BIND_ADDR_ENV)
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
    let bind_addr: SocketAddr = bind_addr.parse().map_err(|err| ConfigError::InvalidEnv {
        name: BIND_ADDR_ENV,
        message: format!("{err}"),
    })?;

    let database_url = env.string(DATABASE_URL_ENV).filter(|url| !url.is_empty());

    let cookie_secure = match env.string(COOKIE_SECURE_ENV) {
        Some(value) => value != "0",
        None => true,
    };

    Ok(AppSettings {
        bind_addr,
        database_url,
        cookie_secure,
    })
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration.
    pub fn new(key: Key, cookie_secure: bool, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            bind_addr,
            db_pool: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without one, the server falls back to fixture adapters: useful for
    /// local development, useless in production.
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
