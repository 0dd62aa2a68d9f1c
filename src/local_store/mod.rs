//! The legacy browser-era store: namespaced JSON blobs over a string
//! key-value backend, with a whole-store snapshot taken before every write.

mod backend;
mod records;

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::auth::MASTER_ADMIN_USERNAME;
use crate::error::AppError;
use crate::models::DrillType;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use records::{LocalDrillResult, LocalDrillSession, LocalEvaluation, LocalNote, LocalUser};

pub const USERS_KEY: &str = "baseball_umpire_users";
pub const DRILL_RESULTS_KEY: &str = "baseball_umpire_drill_results";
pub const NOTES_KEY: &str = "baseball_umpire_notes";
pub const ACTIVE_SESSIONS_KEY: &str = "baseball_umpire_active_sessions";
pub const SESSION_HISTORY_KEY: &str = "baseball_umpire_session_history";
pub const GAME_FILM_KEY: &str = "baseball_umpire_game_film";
pub const DATA_VERSION_KEY: &str = "baseball_umpire_data_version";
pub const BACKUP_KEY: &str = "baseball_umpire_backup";

pub const CURRENT_DATA_VERSION: &str = "1.0.0";

#[derive(Error, Debug)]
pub enum LocalStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Local store lock poisoned")]
    Poisoned,
}

/// Shared handle managed by Rocket. All access goes through [`LocalStore::lock`].
pub struct LocalStore {
    inner: Mutex<LegacyStorage>,
}

impl LocalStore {
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self {
            inner: Mutex::new(LegacyStorage {
                backend: Box::new(backend),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, LocalStoreError> {
        let backend = FileBackend::open(path)?;
        info!(path = %backend.path().display(), "Opened local store");
        Ok(Self::new(backend))
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, LegacyStorage>, LocalStoreError> {
        self.inner.lock().map_err(|_| LocalStoreError::Poisoned)
    }
}

/// Who is asking for a privileged operation.
#[derive(Debug, Clone, Copy)]
pub enum Actor<'a> {
    /// A legacy account id; it must be an admin in this store.
    Local(&'a str),
    /// An admin already authorized against the relational store.
    Verified,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Backup {
    users: Option<String>,
    drill_results: Option<String>,
    notes: Option<String>,
    sessions: Option<String>,
    game_film: Option<String>,
    timestamp: DateTime<Utc>,
    version: String,
}

/// Everything in the store, as produced by an export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSnapshot {
    pub users: Vec<LocalUser>,
    pub drill_results: Vec<LocalDrillResult>,
    pub notes: Vec<LocalNote>,
    pub sessions: Vec<LocalDrillSession>,
    pub game_film: Vec<LocalEvaluation>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportPayload {
    users: Option<Vec<Value>>,
    drill_results: Option<Vec<Value>>,
    notes: Option<Vec<Value>>,
    sessions: Option<Vec<Value>>,
    game_film: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct OrphanReport {
    pub orphaned_results: Vec<LocalDrillResult>,
    pub orphaned_notes: Vec<LocalNote>,
    pub orphaned_sessions: Vec<LocalDrillSession>,
    pub orphaned_evaluations: Vec<LocalEvaluation>,
}

impl OrphanReport {
    pub fn total(&self) -> usize {
        self.orphaned_results.len()
            + self.orphaned_notes.len()
            + self.orphaned_sessions.len()
            + self.orphaned_evaluations.len()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CleanupReport {
    pub orphaned_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

fn valid_records<T: DeserializeOwned>(key: &str, values: Vec<Value>) -> Vec<T> {
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();

    if records.len() < total {
        warn!(key, dropped = total - records.len(), "Dropped invalid records");
    }

    records
}

pub struct LegacyStorage {
    backend: Box<dyn KeyValueBackend>,
}

impl LegacyStorage {
    fn create_backup(&mut self) {
        let snapshot = || -> Result<String, LocalStoreError> {
            let backup = Backup {
                users: self.backend.get(USERS_KEY)?,
                drill_results: self.backend.get(DRILL_RESULTS_KEY)?,
                notes: self.backend.get(NOTES_KEY)?,
                sessions: self.backend.get(SESSION_HISTORY_KEY)?,
                game_film: self.backend.get(GAME_FILM_KEY)?,
                timestamp: Utc::now(),
                version: CURRENT_DATA_VERSION.to_string(),
            };
            Ok(serde_json::to_string(&backup)?)
        };

        let result = snapshot().and_then(|raw| self.backend.set(BACKUP_KEY, &raw));
        if let Err(err) = result {
            error!(error = %err, "Failed to create backup");
        }
    }

    fn restore_from_backup(&mut self) -> bool {
        let backup = match self.backend.get(BACKUP_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Backup>(&raw) {
                Ok(backup) => backup,
                Err(err) => {
                    error!(error = %err, "Backup is unreadable");
                    return false;
                }
            },
            Ok(None) => return false,
            Err(err) => {
                error!(error = %err, "Failed to read backup");
                return false;
            }
        };

        let entries = [
            (USERS_KEY, backup.users),
            (DRILL_RESULTS_KEY, backup.drill_results),
            (NOTES_KEY, backup.notes),
            (SESSION_HISTORY_KEY, backup.sessions),
            (GAME_FILM_KEY, backup.game_film),
        ];

        for (key, value) in entries {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                if let Err(err) = self.backend.set(key, &value) {
                    error!(key, error = %err, "Failed to restore key from backup");
                    return false;
                }
            }
        }

        info!(taken_at = %backup.timestamp, "Data restored from backup");
        true
    }

    /// Returns the raw value under `key`, recovering from the backup when it is
    /// not valid JSON and falling back to `default` when recovery fails.
    fn safe_get(&mut self, key: &str, default: &str) -> Result<String, LocalStoreError> {
        let Some(item) = self.backend.get(key)? else {
            return Ok(default.to_string());
        };

        match serde_json::from_str::<Value>(&item) {
            Ok(_) => Ok(item),
            Err(err) => {
                error!(key, error = %err, "Corrupted data detected");

                if self.restore_from_backup() {
                    if let Some(restored) = self.backend.get(key)? {
                        if serde_json::from_str::<Value>(&restored).is_ok() {
                            return Ok(restored);
                        }
                    }
                    error!(key, "Backup restoration did not yield valid data");
                }

                self.backend.remove(key)?;
                Ok(default.to_string())
            }
        }
    }

    fn safe_set(&mut self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        self.create_backup();

        let written = serde_json::from_str::<Value>(value)
            .map_err(LocalStoreError::from)
            .and_then(|_| self.backend.set(key, value))
            .and_then(|_| self.backend.set(DATA_VERSION_KEY, CURRENT_DATA_VERSION));

        if let Err(err) = written {
            error!(key, error = %err, "Failed to save data");
            self.restore_from_backup();
            return Err(err);
        }

        Ok(())
    }

    fn read_list<T: DeserializeOwned>(&mut self, key: &str) -> Result<Vec<T>, LocalStoreError> {
        let raw = self.safe_get(key, "[]")?;

        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => Ok(valid_records(key, values)),
            Err(err) => {
                warn!(key, error = %err, "Stored value is not a list");
                Ok(Vec::new())
            }
        }
    }

    fn write_list<T: Serialize>(&mut self, key: &str, records: &[T]) -> Result<(), LocalStoreError> {
        let raw = serde_json::to_string(records)?;
        self.safe_set(key, &raw)
    }

    fn read_active_sessions(&mut self) -> Result<Map<String, Value>, LocalStoreError> {
        let raw = self.safe_get(ACTIVE_SESSIONS_KEY, "{}")?;

        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(map) => Ok(map),
            Err(err) => {
                warn!(error = %err, "Active sessions are not an object");
                Ok(Map::new())
            }
        }
    }

    fn require_admin(&mut self, actor: Actor<'_>, action: &str) -> Result<(), AppError> {
        let Actor::Local(user_id) = actor else {
            return Ok(());
        };

        match self.get_user(user_id)? {
            Some(admin) if admin.is_admin => Ok(()),
            _ => {
                warn!(user_id, action, "Unauthorized local store operation");
                Err(AppError::Authorization(format!(
                    "Only admins can {}",
                    action
                )))
            }
        }
    }

    /// Takes a backup on a version mismatch and restores the master admin's
    /// flags if they were removed.
    #[instrument(skip(self))]
    pub fn init(&mut self) -> Result<(), AppError> {
        let version = self.backend.get(DATA_VERSION_KEY)?;
        if version.as_deref() != Some(CURRENT_DATA_VERSION) {
            info!(found = ?version, "Data version mismatch, taking backup");
            self.create_backup();
        }

        match self.ensure_master_admin_flags() {
            Err(AppError::Storage(err)) => {
                error!(error = %err, "Initialization failed");
                if self.restore_from_backup() {
                    info!("Data restored from backup during initialization");
                    return self.ensure_master_admin_flags();
                }
                Err(AppError::Storage(err))
            }
            other => other,
        }
    }

    fn ensure_master_admin_flags(&mut self) -> Result<(), AppError> {
        let mut users = self.get_users()?;

        match users
            .iter_mut()
            .find(|u| u.username == MASTER_ADMIN_USERNAME)
        {
            Some(master) if !master.is_admin || !master.is_evaluator => {
                warn!("Restoring master admin permissions in local store");
                master.is_admin = true;
                master.is_evaluator = true;
                self.write_list(USERS_KEY, &users)?;
            }
            Some(_) => {}
            None => warn!("Master admin account missing from local store"),
        }

        Ok(())
    }

    pub fn get_users(&mut self) -> Result<Vec<LocalUser>, AppError> {
        Ok(self.read_list(USERS_KEY)?)
    }

    pub fn get_user(&mut self, user_id: &str) -> Result<Option<LocalUser>, AppError> {
        Ok(self.get_users()?.into_iter().find(|u| u.id == user_id))
    }

    pub fn get_user_by_username(&mut self, username: &str) -> Result<Option<LocalUser>, AppError> {
        Ok(self
            .get_users()?
            .into_iter()
            .find(|u| u.username == username))
    }

    pub fn get_user_by_email(&mut self, email: &str) -> Result<Option<LocalUser>, AppError> {
        Ok(self.get_users()?.into_iter().find(|u| u.email == email))
    }

    #[instrument(skip_all, fields(username = %user.username))]
    pub fn add_user(&mut self, user: LocalUser) -> Result<(), AppError> {
        let mut users = self.get_users()?;

        if users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                user.username
            )));
        }

        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' already exists",
                user.email
            )));
        }

        users.push(user);
        self.write_list(USERS_KEY, &users)?;
        info!(total = users.len(), "User added to local store");
        Ok(())
    }

    #[instrument(skip(self, updated))]
    pub fn update_user(&mut self, user_id: &str, updated: LocalUser) -> Result<(), AppError> {
        let mut users = self.get_users()?;

        if users
            .iter()
            .any(|u| u.id != user_id && (u.username == updated.username || u.email == updated.email))
        {
            return Err(AppError::Conflict(
                "Username or email already in use".to_string(),
            ));
        }

        let slot = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Local user {} not found", user_id)))?;
        *slot = updated;

        self.write_list(USERS_KEY, &users)?;
        Ok(())
    }

    /// Removes a user and everything that references them. Only admins may
    /// delete, and the master admin cannot be deleted.
    #[instrument(skip(self))]
    pub fn delete_user(&mut self, user_id: &str, actor: Actor<'_>) -> Result<(), AppError> {
        self.require_admin(actor, "delete users")?;

        let mut users = self.get_users()?;
        let Some(target) = users.iter().find(|u| u.id == user_id) else {
            return Err(AppError::NotFound(format!(
                "Local user {} not found",
                user_id
            )));
        };

        if target.username == MASTER_ADMIN_USERNAME {
            return Err(AppError::Authorization(
                "Cannot delete master admin account".to_string(),
            ));
        }

        users.retain(|u| u.id != user_id);
        self.write_list(USERS_KEY, &users)?;

        let mut results = self.get_drill_results()?;
        results.retain(|r| r.user_id != user_id);
        self.write_list(DRILL_RESULTS_KEY, &results)?;

        let mut notes = self.get_notes()?;
        notes.retain(|n| n.user_id != user_id);
        self.write_list(NOTES_KEY, &notes)?;

        let mut sessions = self.get_session_history()?;
        sessions.retain(|s| s.user_id != user_id);
        self.write_list(SESSION_HISTORY_KEY, &sessions)?;

        let mut evaluations = self.get_evaluations()?;
        evaluations.retain(|e| e.target_user_id != user_id && e.evaluator_id != user_id);
        self.write_list(GAME_FILM_KEY, &evaluations)?;

        let mut active = self.read_active_sessions()?;
        if active.remove(user_id).is_some() {
            self.safe_set(ACTIVE_SESSIONS_KEY, &serde_json::to_string(&active)?)?;
        }

        info!("Deleted local user and dependent records");
        Ok(())
    }

    pub fn get_drill_results(&mut self) -> Result<Vec<LocalDrillResult>, AppError> {
        Ok(self.read_list(DRILL_RESULTS_KEY)?)
    }

    pub fn add_drill_result(&mut self, result: LocalDrillResult) -> Result<(), AppError> {
        let mut results = self.get_drill_results()?;
        results.push(result);
        self.write_list(DRILL_RESULTS_KEY, &results)?;
        Ok(())
    }

    pub fn get_user_drill_results(
        &mut self,
        user_id: &str,
    ) -> Result<Vec<LocalDrillResult>, AppError> {
        let mut results = self.get_drill_results()?;
        results.retain(|r| r.user_id == user_id);
        Ok(results)
    }

    pub fn get_user_drill_results_by_type(
        &mut self,
        user_id: &str,
        drill_type: DrillType,
    ) -> Result<Vec<LocalDrillResult>, AppError> {
        let mut results = self.get_user_drill_results(user_id)?;
        results.retain(|r| r.drill_type == drill_type);
        Ok(results)
    }

    pub fn get_notes(&mut self) -> Result<Vec<LocalNote>, AppError> {
        Ok(self.read_list(NOTES_KEY)?)
    }

    pub fn add_note(&mut self, note: LocalNote) -> Result<(), AppError> {
        let mut notes = self.get_notes()?;
        notes.push(note);
        self.write_list(NOTES_KEY, &notes)?;
        Ok(())
    }

    pub fn update_note(&mut self, note_id: &str, updated: LocalNote) -> Result<(), AppError> {
        let mut notes = self.get_notes()?;
        let slot = notes
            .iter_mut()
            .find(|n| n.id == note_id)
            .ok_or_else(|| AppError::NotFound(format!("Local note {} not found", note_id)))?;
        *slot = updated;

        self.write_list(NOTES_KEY, &notes)?;
        Ok(())
    }

    pub fn get_user_notes(&mut self, user_id: &str) -> Result<Vec<LocalNote>, AppError> {
        let mut notes = self.get_notes()?;
        notes.retain(|n| n.user_id == user_id);
        Ok(notes)
    }

    pub fn get_evaluations(&mut self) -> Result<Vec<LocalEvaluation>, AppError> {
        Ok(self.read_list(GAME_FILM_KEY)?)
    }

    pub fn add_evaluation(&mut self, evaluation: LocalEvaluation) -> Result<(), AppError> {
        let mut evaluations = self.get_evaluations()?;
        evaluations.push(evaluation);
        self.write_list(GAME_FILM_KEY, &evaluations)?;
        Ok(())
    }

    pub fn update_evaluation(
        &mut self,
        evaluation_id: &str,
        updated: LocalEvaluation,
    ) -> Result<(), AppError> {
        let mut evaluations = self.get_evaluations()?;
        let slot = evaluations
            .iter_mut()
            .find(|e| e.id == evaluation_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Local evaluation {} not found", evaluation_id))
            })?;
        *slot = updated;

        self.write_list(GAME_FILM_KEY, &evaluations)?;
        Ok(())
    }

    pub fn delete_evaluation(&mut self, evaluation_id: &str) -> Result<(), AppError> {
        let mut evaluations = self.get_evaluations()?;
        evaluations.retain(|e| e.id != evaluation_id);
        self.write_list(GAME_FILM_KEY, &evaluations)?;
        Ok(())
    }

    /// Evaluations about `user_id`, newest first.
    pub fn get_user_evaluations(&mut self, user_id: &str) -> Result<Vec<LocalEvaluation>, AppError> {
        let mut evaluations = self.get_evaluations()?;
        evaluations.retain(|e| e.target_user_id == user_id);
        evaluations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(evaluations)
    }

    pub fn get_active_session(
        &mut self,
        user_id: &str,
    ) -> Result<Option<LocalDrillSession>, AppError> {
        let active = self.read_active_sessions()?;

        Ok(active
            .get(user_id)
            .and_then(|value| serde_json::from_value(value.clone()).ok()))
    }

    pub fn save_active_session(&mut self, session: &LocalDrillSession) -> Result<(), AppError> {
        let mut active = self.read_active_sessions()?;
        active.insert(session.user_id.clone(), serde_json::to_value(session)?);
        self.safe_set(ACTIVE_SESSIONS_KEY, &serde_json::to_string(&active)?)?;
        Ok(())
    }

    pub fn clear_active_session(&mut self, user_id: &str) -> Result<(), AppError> {
        let mut active = self.read_active_sessions()?;
        active.remove(user_id);
        self.safe_set(ACTIVE_SESSIONS_KEY, &serde_json::to_string(&active)?)?;
        Ok(())
    }

    pub fn get_session_history(&mut self) -> Result<Vec<LocalDrillSession>, AppError> {
        Ok(self.read_list(SESSION_HISTORY_KEY)?)
    }

    pub fn save_session_to_history(&mut self, session: LocalDrillSession) -> Result<(), AppError> {
        let mut history = self.get_session_history()?;
        history.push(session);
        self.write_list(SESSION_HISTORY_KEY, &history)?;
        Ok(())
    }

    /// Archived sessions of `user_id`, newest first.
    pub fn get_user_sessions(&mut self, user_id: &str) -> Result<Vec<LocalDrillSession>, AppError> {
        let mut sessions = self.get_session_history()?;
        sessions.retain(|s| s.user_id == user_id && !s.is_active);
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    pub fn export_all_data(&mut self) -> Result<LocalSnapshot, AppError> {
        Ok(LocalSnapshot {
            users: self.get_users()?,
            drill_results: self.get_drill_results()?,
            notes: self.get_notes()?,
            sessions: self.get_session_history()?,
            game_film: self.get_evaluations()?,
            export_date: Utc::now(),
            version: CURRENT_DATA_VERSION.to_string(),
        })
    }

    /// Replaces the collections present in `json`. Invalid records are dropped;
    /// a payload that is not an export rolls back to the pre-import backup.
    #[instrument(skip(self, json))]
    pub fn import_data(&mut self, json: &str, actor: Actor<'_>) -> Result<(), AppError> {
        self.require_admin(actor, "import data")?;
        self.create_backup();

        let payload: ImportPayload = match serde_json::from_str(json) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %err, "Import payload rejected");
                self.restore_from_backup();
                return Err(AppError::Validation(format!("Invalid import data: {}", err)));
            }
        };

        let imported = self.apply_import(payload);
        if let Err(err) = imported {
            error!(error = %err, "Import failed, rolling back");
            self.restore_from_backup();
            return Err(err);
        }

        self.init()
    }

    fn apply_import(&mut self, payload: ImportPayload) -> Result<(), AppError> {
        if let Some(users) = payload.users {
            let users: Vec<LocalUser> = valid_records(USERS_KEY, users);
            self.write_list(USERS_KEY, &users)?;
        }
        if let Some(results) = payload.drill_results {
            let results: Vec<LocalDrillResult> = valid_records(DRILL_RESULTS_KEY, results);
            self.write_list(DRILL_RESULTS_KEY, &results)?;
        }
        if let Some(notes) = payload.notes {
            let notes: Vec<LocalNote> = valid_records(NOTES_KEY, notes);
            self.write_list(NOTES_KEY, &notes)?;
        }
        if let Some(sessions) = payload.sessions {
            let sessions: Vec<LocalDrillSession> = valid_records(SESSION_HISTORY_KEY, sessions);
            self.write_list(SESSION_HISTORY_KEY, &sessions)?;
        }
        if let Some(evaluations) = payload.game_film {
            let evaluations: Vec<LocalEvaluation> = valid_records(GAME_FILM_KEY, evaluations);
            self.write_list(GAME_FILM_KEY, &evaluations)?;
        }
        Ok(())
    }

    pub fn get_orphaned_data(&mut self) -> Result<OrphanReport, AppError> {
        let user_ids: HashSet<String> = self.get_users()?.into_iter().map(|u| u.id).collect();

        let mut orphaned_results = self.get_drill_results()?;
        orphaned_results.retain(|r| !user_ids.contains(&r.user_id));

        let mut orphaned_notes = self.get_notes()?;
        orphaned_notes.retain(|n| !user_ids.contains(&n.user_id));

        let mut orphaned_sessions = self.get_session_history()?;
        orphaned_sessions.retain(|s| !user_ids.contains(&s.user_id));

        let mut orphaned_evaluations = self.get_evaluations()?;
        orphaned_evaluations.retain(|e| {
            !user_ids.contains(&e.target_user_id) || !user_ids.contains(&e.evaluator_id)
        });

        Ok(OrphanReport {
            orphaned_results,
            orphaned_notes,
            orphaned_sessions,
            orphaned_evaluations,
        })
    }

    #[instrument(skip(self))]
    pub fn cleanup_orphaned_data(&mut self, actor: Actor<'_>) -> Result<CleanupReport, AppError> {
        self.require_admin(actor, "clean up data")?;

        let orphaned_count = self.get_orphaned_data()?.total();
        if orphaned_count == 0 {
            return Ok(CleanupReport { orphaned_count });
        }

        let user_ids: HashSet<String> = self.get_users()?.into_iter().map(|u| u.id).collect();

        let mut results = self.get_drill_results()?;
        results.retain(|r| user_ids.contains(&r.user_id));
        self.write_list(DRILL_RESULTS_KEY, &results)?;

        let mut notes = self.get_notes()?;
        notes.retain(|n| user_ids.contains(&n.user_id));
        self.write_list(NOTES_KEY, &notes)?;

        let mut sessions = self.get_session_history()?;
        sessions.retain(|s| user_ids.contains(&s.user_id));
        self.write_list(SESSION_HISTORY_KEY, &sessions)?;

        let mut evaluations = self.get_evaluations()?;
        evaluations
            .retain(|e| user_ids.contains(&e.target_user_id) && user_ids.contains(&e.evaluator_id));
        self.write_list(GAME_FILM_KEY, &evaluations)?;

        info!(orphaned_count, "Cleaned up orphaned records");
        Ok(CleanupReport { orphaned_count })
    }

    pub fn check_data_integrity(&mut self) -> Result<IntegrityReport, AppError> {
        let mut issues = Vec::new();

        let users = self.get_users()?;
        let user_ids: HashSet<&str> = users.iter().map(|u| u.id.as_str()).collect();

        let orphaned_results = self
            .get_drill_results()?
            .iter()
            .filter(|r| !user_ids.contains(r.user_id.as_str()))
            .count();
        if orphaned_results > 0 {
            issues.push(format!("Found {} orphaned drill results", orphaned_results));
        }

        let orphaned_notes = self
            .get_notes()?
            .iter()
            .filter(|n| !user_ids.contains(n.user_id.as_str()))
            .count();
        if orphaned_notes > 0 {
            issues.push(format!("Found {} orphaned notes", orphaned_notes));
        }

        let mut seen = HashSet::new();
        let duplicates: Vec<&str> = users
            .iter()
            .map(|u| u.username.as_str())
            .filter(|name| !seen.insert(*name))
            .collect();
        if !duplicates.is_empty() {
            issues.push(format!(
                "Found duplicate usernames: {}",
                duplicates.join(", ")
            ));
        }

        if !users.iter().any(|u| u.username == MASTER_ADMIN_USERNAME) {
            issues.push("Master admin account is missing".to_string());
        }

        Ok(IntegrityReport {
            is_valid: issues.is_empty(),
            issues,
        })
    }

    #[cfg(test)]
    pub(crate) fn write_raw(&mut self, key: &str, value: &str) {
        self.backend.set(key, value).unwrap();
    }

    #[cfg(test)]
    pub(crate) fn read_raw(&self, key: &str) -> Option<String> {
        self.backend.get(key).unwrap()
    }
}
