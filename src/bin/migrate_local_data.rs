use anyhow::Context;
use sqlx::SqlitePool;

use umpire_drill_tracker::env::{AppConfig, load_environment};
use umpire_drill_tracker::local_store::LocalStore;
use umpire_drill_tracker::migration::migrate_from_store;
use umpire_drill_tracker::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = load_environment() {
        eprintln!("Failed to load environment files: {}", e);
    }
    let _otel_guard = init_tracing();

    let config = AppConfig::from_env()?;
    config.ensure_data_dirs()?;

    let store = LocalStore::open(&config.local_store_path).with_context(|| {
        format!(
            "Failed to open local store at {}",
            config.local_store_path.display()
        )
    })?;

    let pool = SqlitePool::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", config.database_url))?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let report = migrate_from_store(&pool, &store).await?;

    println!("{}", report.message);
    println!(
        "    Users: {} created, {} matched, {} failed",
        report.users_created, report.users_matched, report.users_failed
    );
    println!(
        "    Drill results: {} migrated, {} skipped",
        report.drill_results_migrated, report.drill_results_skipped
    );
    println!(
        "    Notes: {} migrated, {} skipped",
        report.notes_migrated, report.notes_skipped
    );
    println!(
        "    Evaluations: {} migrated, {} skipped",
        report.evaluations_migrated, report.evaluations_skipped
    );
    println!(
        "    Sessions: {} migrated, {} skipped",
        report.sessions_migrated, report.sessions_skipped
    );

    Ok(())
}
