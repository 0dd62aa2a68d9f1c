use std::time::Duration;

use rocket::tokio;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info, warn};

use umpire_drill_tracker::db::{clean_expired_sessions, ensure_master_admin};
use umpire_drill_tracker::env::{AppConfig, load_environment};
use umpire_drill_tracker::error::AppError;
use umpire_drill_tracker::init_rocket;
use umpire_drill_tracker::local_store::LocalStore;
use umpire_drill_tracker::telemetry::init_tracing;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Rocket(Box<rocket::Error>),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::Error> for Error {
    fn from(value: rocket::Error) -> Self {
        Error::Rocket(Box::new(value))
    }
}

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

fn spawn_session_purge(pool: SqlitePool) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(SESSION_PURGE_INTERVAL).await;
        }
    });
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    if let Err(e) = load_environment() {
        eprintln!("Failed to load environment files: {}", e);
    }
    let _otel_guard = init_tracing();

    let config = AppConfig::from_env()?;
    config.ensure_data_dirs()?;

    let pool = SqlitePool::connect(&config.database_url).await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed successfully");

    match config.master_admin_password.as_deref() {
        Some(password) => {
            let admin = ensure_master_admin(&pool, password).await?;
            info!(username = %admin.username, "Master admin account ready");
        }
        None => warn!("MASTER_ADMIN_PASSWORD not set, skipping master admin seeding"),
    }

    let local_store = LocalStore::open(&config.local_store_path).map_err(AppError::from)?;
    local_store
        .lock()
        .map_err(AppError::from)?
        .init()?;

    spawn_session_purge(pool.clone());

    let _rocket = init_rocket(pool, local_store, config).launch().await?;
    Ok(())
}
