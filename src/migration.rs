//! One-way copy of the legacy store into the relational store. Legacy user ids
//! are remapped to relational ids; dependents follow the mapping or are skipped.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{error, info, instrument, warn};

use crate::db;
use crate::error::AppError;
use crate::local_store::{LocalSnapshot, LocalStore};
use crate::models::{DrillResult, DrillSession, GameFilmEvaluation, Note};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MigrationReport {
    pub users_created: usize,
    pub users_matched: usize,
    pub users_failed: usize,
    pub drill_results_migrated: usize,
    pub drill_results_skipped: usize,
    pub notes_migrated: usize,
    pub notes_skipped: usize,
    pub evaluations_migrated: usize,
    pub evaluations_skipped: usize,
    pub sessions_migrated: usize,
    pub sessions_skipped: usize,
    pub message: String,
}

impl MigrationReport {
    fn summarize(&mut self) {
        self.message = format!(
            "Migration completed: {} users created, {} matched, {} drill results, {} notes, {} evaluations and {} sessions migrated",
            self.users_created,
            self.users_matched,
            self.drill_results_migrated,
            self.notes_migrated,
            self.evaluations_migrated,
            self.sessions_migrated,
        );
    }
}

type IdMap = HashMap<String, String>;

async fn map_users(pool: &Pool<Sqlite>, data: &LocalSnapshot, report: &mut MigrationReport) -> IdMap {
    let mut ids = IdMap::new();

    for local in &data.users {
        match db::find_user_by_username(pool, &local.username).await {
            Ok(Some(existing)) => {
                ids.insert(local.id.clone(), existing.id);
                report.users_matched += 1;
                continue;
            }
            Ok(None) => {}
            Err(err) => {
                error!(username = %local.username, error = %err, "Lookup failed, skipping user");
                report.users_failed += 1;
                continue;
            }
        }

        match db::create_user(pool, &local.to_new_user(), &local.password).await {
            Ok(created) => {
                ids.insert(local.id.clone(), created.id);
                report.users_created += 1;
            }
            Err(err) => {
                error!(username = %local.username, error = %err, "Failed to create user");
                report.users_failed += 1;
            }
        }
    }

    ids
}

/// Copies `data` into the relational store. Never fails as a whole: every
/// entity that cannot be mapped or written is logged and counted as skipped.
#[instrument(skip_all, fields(users = data.users.len()))]
pub async fn migrate_local_data(pool: &Pool<Sqlite>, data: LocalSnapshot) -> MigrationReport {
    info!("Starting data migration from local store");
    let mut report = MigrationReport::default();

    let ids = map_users(pool, &data, &mut report).await;
    let remap = |id: &Option<String>| id.as_ref().and_then(|id| ids.get(id).cloned());

    for local in data.drill_results {
        let Some(user_id) = ids.get(&local.user_id).cloned() else {
            warn!(result_id = %local.id, user_id = %local.user_id, "Skipping drill result for unmapped user");
            report.drill_results_skipped += 1;
            continue;
        };

        let evaluator_id = remap(&local.evaluator_id);
        let result = DrillResult {
            user_id,
            evaluator_id,
            ..DrillResult::from(local)
        };

        match db::add_drill_result(pool, &result).await {
            Ok(()) => report.drill_results_migrated += 1,
            Err(err) => {
                warn!(result_id = %result.id, error = %err, "Failed to migrate drill result");
                report.drill_results_skipped += 1;
            }
        }
    }

    for local in data.notes {
        let Some(user_id) = ids.get(&local.user_id).cloned() else {
            warn!(note_id = %local.id, user_id = %local.user_id, "Skipping note for unmapped user");
            report.notes_skipped += 1;
            continue;
        };

        let note = Note {
            user_id,
            ..Note::from(local)
        };

        match db::add_note(pool, &note).await {
            Ok(()) => report.notes_migrated += 1,
            Err(err) => {
                warn!(note_id = %note.id, error = %err, "Failed to migrate note");
                report.notes_skipped += 1;
            }
        }
    }

    for local in data.game_film {
        let (Some(evaluator_id), Some(target_user_id)) = (
            ids.get(&local.evaluator_id).cloned(),
            ids.get(&local.target_user_id).cloned(),
        ) else {
            warn!(evaluation_id = %local.id, "Skipping evaluation with unmapped participants");
            report.evaluations_skipped += 1;
            continue;
        };

        let evaluation = GameFilmEvaluation {
            evaluator_id,
            target_user_id,
            ..GameFilmEvaluation::from(local)
        };

        match db::add_evaluation(pool, &evaluation).await {
            Ok(()) => report.evaluations_migrated += 1,
            Err(err) => {
                warn!(evaluation_id = %evaluation.id, error = %err, "Failed to migrate evaluation");
                report.evaluations_skipped += 1;
            }
        }
    }

    for local in data.sessions {
        let Some(user_id) = ids.get(&local.user_id).cloned() else {
            warn!(session_id = %local.id, user_id = %local.user_id, "Skipping session for unmapped user");
            report.sessions_skipped += 1;
            continue;
        };

        let evaluator_id = remap(&local.evaluator_id);
        let session = DrillSession {
            user_id,
            evaluator_id,
            // History entries are always archived on the relational side.
            is_active: false,
            ..DrillSession::from(local)
        };

        match db::save_session(pool, &session).await {
            Ok(()) => report.sessions_migrated += 1,
            Err(err) => {
                warn!(session_id = %session.id, error = %err, "Failed to migrate session");
                report.sessions_skipped += 1;
            }
        }
    }

    report.summarize();
    info!(report = ?report, "Data migration finished");
    report
}

/// Snapshots the legacy store and migrates it.
pub async fn migrate_from_store(
    pool: &Pool<Sqlite>,
    store: &LocalStore,
) -> Result<MigrationReport, AppError> {
    let snapshot = {
        let mut legacy = store.lock()?;
        legacy.export_all_data()?
    };

    Ok(migrate_local_data(pool, snapshot).await)
}
