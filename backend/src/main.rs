//! Backend entry-point: configuration, migrations, and server start-up.

use std::env;

use actix_web::cookie::Key;
use diesel::Connection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::outbound::persistence::{DbPool, PoolConfig};
use backend::server::{ServerConfig, settings_from_env};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = settings_from_env(&DefaultEnv::new())
        .map_err(|err| std::io::Error::other(err.to_string()))?;

    let key = load_session_key()?;

    let mut config = ServerConfig::new(key, settings.cookie_secure, settings.bind_addr);
    if let Some(database_url) = &settings.database_url {
        run_migrations(database_url.clone()).await?;
        let pool = DbPool::new(PoolConfig::new(database_url))
            .await
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        config = config.with_db_pool(pool);
    } else {
        warn!("DATABASE_URL not set; running with fixture adapters (development only)");
    }

    backend::server::run(config).await
}

/// Read the session key from disk, generating an ephemeral one only when
/// explicitly allowed (or in debug builds).
fn load_session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {e}"
                )))
            }
        }
    }
}

/// Apply pending migrations before the pool comes up.
///
/// Diesel's migration harness is synchronous, so this runs on a blocking
/// thread with its own short-lived connection.
async fn run_migrations(database_url: String) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || {
        let mut conn = diesel::PgConnection::establish(&database_url)
            .map_err(|err| std::io::Error::other(format!("migration connection failed: {err}")))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| std::io::Error::other(format!("migrations failed: {err}")))?;
        if !applied.is_empty() {
            info!(count = applied.len(), "applied pending migrations");
        }
        Ok(())
    })
    .await
    .map_err(|err| std::io::Error::other(format!("migration task failed: {err}")))?
}
