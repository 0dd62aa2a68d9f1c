use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::auth::{Permission, User};
use crate::db;
use crate::error::AppError;
use crate::models::{DrillResult, DrillSession, DrillType, Note, ResultType, new_id};

#[derive(Debug, Clone, Serialize)]
pub struct EndedSession {
    pub session: DrillSession,
    pub results: Vec<DrillResult>,
    pub note: Option<Note>,
}

fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let seconds = (end - start).num_seconds().max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn count(results: &[ResultType], kind: ResultType) -> usize {
    results.iter().filter(|r| **r == kind).count()
}

/// Journal entry written when a session ends with notes.
pub fn session_summary(session: &DrillSession, end_time: DateTime<Utc>, notes: &str) -> String {
    let label = session.drill_type.label();
    let summary = format!(
        "Session Summary:\n\u{2022} Duration: {}\n\u{2022} Total Calls: {}\n\u{2022} Confirmed: {}\n\u{2022} Stands: {}\n\u{2022} Overturned: {}",
        format_duration(session.start_time, end_time),
        session.results.len(),
        count(&session.results, ResultType::Confirmed),
        count(&session.results, ResultType::Stands),
        count(&session.results, ResultType::Overturned),
    );

    match session.evaluator_username.as_deref() {
        Some(evaluator) if session.is_evaluator_recorded => format!(
            "Evaluator Training Session: {label}\n\nEvaluated by: {evaluator}\n{summary}\n\nEvaluator Notes:\n{notes}"
        ),
        _ => format!("Training Session: {label}\n\n{summary}\n\nNotes:\n{notes}"),
    }
}

fn ensure_can_record(actor: &User, session: &DrillSession) -> Result<(), AppError> {
    let is_owner = actor.id == session.user_id;
    let is_recording_evaluator = session.evaluator_id.as_deref() == Some(actor.id.as_str());

    if is_owner || is_recording_evaluator {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "Only the trainee or the recording evaluator can change this session".to_string(),
        ))
    }
}

fn ensure_active(session: &DrillSession) -> Result<(), AppError> {
    if session.is_active {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Session {} has already ended",
            session.id
        )))
    }
}

/// Starts a session for `trainee`, replacing any session they had in progress.
#[instrument(skip(pool, trainee, evaluator), fields(trainee = %trainee.username))]
pub async fn begin_session(
    pool: &Pool<Sqlite>,
    trainee: &User,
    drill_type: DrillType,
    evaluator: Option<&User>,
) -> Result<DrillSession, AppError> {
    let discarded = db::discard_active_session(pool, &trainee.id).await?;
    if discarded > 0 {
        info!("Discarded previous active session");
    }

    let session = DrillSession {
        id: new_id(),
        user_id: trainee.id.clone(),
        drill_type,
        start_time: Utc::now(),
        end_time: None,
        results: Vec::new(),
        notes: None,
        evaluator_id: evaluator.map(|e| e.id.clone()),
        evaluator_username: evaluator.map(|e| e.username.clone()),
        is_evaluator_recorded: evaluator.is_some(),
        is_active: true,
    };

    db::save_session(pool, &session).await?;
    info!(session_id = %session.id, drill_type = %drill_type, "Drill session started");

    Ok(session)
}

#[instrument(skip(pool, actor), fields(actor = %actor.username))]
pub async fn record_result(
    pool: &Pool<Sqlite>,
    actor: &User,
    session_id: &str,
    result: ResultType,
) -> Result<DrillSession, AppError> {
    let mut session = db::get_session(pool, session_id).await?;
    ensure_can_record(actor, &session)?;
    ensure_active(&session)?;

    session.results.push(result);
    db::save_session(pool, &session).await?;

    Ok(session)
}

/// Archives the session, writes one drill result per recorded call and, for
/// non-blank notes, a summary note in the trainee's journal.
#[instrument(skip(pool, actor, notes), fields(actor = %actor.username))]
pub async fn end_session(
    pool: &Pool<Sqlite>,
    actor: &User,
    session_id: &str,
    notes: Option<String>,
) -> Result<EndedSession, AppError> {
    let mut session = db::get_session(pool, session_id).await?;
    ensure_can_record(actor, &session)?;
    ensure_active(&session)?;

    let trainee = db::get_user(pool, &session.user_id).await?;
    let end_time = Utc::now();
    let notes = notes.filter(|n| !n.trim().is_empty());

    session.end_time = Some(end_time);
    session.notes = notes.clone();
    session.is_active = false;

    let results: Vec<DrillResult> = session
        .results
        .iter()
        .map(|&result| DrillResult {
            id: new_id(),
            user_id: session.user_id.clone(),
            drill_type: session.drill_type,
            result,
            session_id: Some(session.id.clone()),
            session_start_time: Some(session.start_time),
            session_end_time: Some(end_time),
            session_notes: notes.clone(),
            evaluator_id: session.evaluator_id.clone(),
            evaluator_username: session.evaluator_username.clone(),
            is_evaluator_recorded: session.is_evaluator_recorded,
            timestamp: end_time,
        })
        .collect();

    let note = notes.as_deref().map(|text| Note {
        id: new_id(),
        user_id: trainee.id.clone(),
        username: trainee.username.clone(),
        content: session_summary(&session, end_time, text),
        video_url: None,
        video_file: None,
        timestamp: end_time,
        likes: Vec::new(),
        comments: Vec::new(),
    });

    let mut tx = pool.begin().await?;
    db::save_session(&mut *tx, &session).await?;
    for result in &results {
        db::add_drill_result(&mut *tx, result).await?;
    }
    if let Some(note) = &note {
        db::add_note(&mut *tx, note).await?;
    }
    tx.commit().await?;

    info!(
        session_id = %session.id,
        calls = results.len(),
        with_note = note.is_some(),
        "Drill session ended"
    );

    Ok(EndedSession {
        session,
        results,
        note,
    })
}

#[instrument(skip(pool))]
pub async fn cancel_session(pool: &Pool<Sqlite>, user_id: &str) -> Result<bool, AppError> {
    let discarded = db::discard_active_session(pool, user_id).await?;
    Ok(discarded > 0)
}

/// Rewrites entry `index` of an archived session together with the drill
/// result recorded for it.
#[instrument(skip(pool, admin), fields(admin = %admin.username))]
pub async fn update_session_result(
    pool: &Pool<Sqlite>,
    admin: &User,
    session_id: &str,
    index: usize,
    result: ResultType,
) -> Result<DrillSession, AppError> {
    admin.require_permission(Permission::EditSessionResults)?;

    let mut session = db::get_session(pool, session_id).await?;
    if session.is_active {
        return Err(AppError::Validation(
            "Active sessions cannot be edited".to_string(),
        ));
    }

    let Some(slot) = session.results.get_mut(index) else {
        return Err(AppError::NotFound(format!(
            "Session {} has no result at position {}",
            session_id, index
        )));
    };
    *slot = result;

    let linked = db::get_session_drill_results(pool, session_id).await?;

    let mut tx = pool.begin().await?;
    db::save_session(&mut *tx, &session).await?;
    match linked.get(index) {
        Some(drill_result) => {
            db::update_drill_result_outcome(&mut *tx, &drill_result.id, result).await?
        }
        None => warn!(index, "No drill result linked to session entry"),
    }
    tx.commit().await?;

    info!(session_id, index, result = %result, "Session result updated");
    Ok(session)
}
