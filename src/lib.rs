#[macro_use]
extern crate rocket;

pub mod api;
pub mod auth;
pub mod db;
pub mod drills;
pub mod env;
pub mod error;
pub mod local_store;
pub mod migration;
pub mod models;
pub mod stats;
pub mod telemetry;
pub mod validation;
#[cfg(test)]
mod test;

use api::*;
use auth::{forbidden_api, unauthorized_api};
use env::AppConfig;
use local_store::LocalStore;
use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use telemetry::TelemetryFairing;
use tracing::info;

pub fn init_rocket(pool: SqlitePool, local_store: LocalStore, config: AppConfig) -> Rocket<Build> {
    info!("Starting umpire drill tracker");

    rocket::build()
        .manage(pool)
        .manage(local_store)
        .manage(config)
        .mount(
            "/api",
            routes![
                api_login,
                api_signup,
                api_logout,
                api_me,
                api_me_unauthorized,
                api_update_profile,
                api_change_password,
                api_get_drills,
                api_get_user_results,
                api_get_user_stats,
                api_begin_session,
                api_get_active_session,
                api_record_result,
                api_end_session,
                api_cancel_session,
                api_get_user_sessions,
                api_update_session_result,
                api_leaderboard,
                api_drill_leaderboard,
                api_drill_last20_leaderboard,
                api_my_standing,
                api_get_user_notes,
                api_create_note,
                api_update_note,
                api_delete_note,
                api_get_evaluations,
                api_get_user_evaluations,
                api_create_evaluation,
                api_update_evaluation,
                api_delete_evaluation,
                api_get_all_users,
                api_admin_create_user,
                api_admin_update_user,
                api_admin_delete_user,
                api_export,
                api_migrate,
                api_local_export,
                api_local_import,
                api_local_integrity,
                api_local_orphans,
                api_local_cleanup,
            ],
        )
        .register("/api", catchers![unauthorized_api, forbidden_api])
        .mount("/api", routes![health])
        .attach(TelemetryFairing)
}
