use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqliteExecutor};
use tracing::{info, instrument, warn};

use crate::{
    auth::{DbUser, DbUserSession, MASTER_ADMIN_USERNAME, User, UserSession},
    error::AppError,
    models::{
        DbDrillResult, DbDrillSession, DbNote, DrillResult, DrillSession, DrillType,
        EducationLevel, GameFilmEvaluation, Level, Location, Note, ResultType, new_id,
    },
};

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, level, location, city, state, \
     education_level, conferences_worked, is_admin, is_evaluator, profile_photo, created_at";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub level: Level,
    pub location: Location,
    pub city: Option<String>,
    pub state: Option<String>,
    pub education_level: Option<EducationLevel>,
    pub conferences_worked: Option<String>,
    pub is_admin: bool,
    pub is_evaluator: bool,
    pub profile_photo: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial profile update. `None` leaves a field untouched; an empty string
/// clears an optional text field.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub level: Option<Level>,
    pub location: Option<Location>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub education_level: Option<EducationLevel>,
    pub conferences_worked: Option<String>,
    pub is_admin: Option<bool>,
    pub is_evaluator: Option<bool>,
    pub profile_photo: Option<String>,
}

fn merge_optional(update: Option<String>, current: Option<String>) -> Option<String> {
    match update {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value),
        None => current,
    }
}

fn to_users(rows: Vec<DbUser>) -> Result<Vec<User>, AppError> {
    rows.into_iter().map(User::try_from).collect()
}

#[instrument(skip(pool))]
pub async fn get_user(pool: &Pool<Sqlite>, id: &str) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => User::try_from(user),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn find_user_by_username(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<Option<User>, AppError> {
    info!("Getting user by username");
    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    row.map(User::try_from).transpose()
}

#[instrument(skip(pool))]
pub async fn find_user_by_email(
    pool: &Pool<Sqlite>,
    email: &str,
) -> Result<Option<User>, AppError> {
    info!("Getting user by email");
    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(User::try_from).transpose()
}

#[instrument(skip(pool))]
pub async fn get_all_users(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    info!("Getting all users");
    let rows = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, rowid ASC"
    ))
    .fetch_all(pool)
    .await?;

    to_users(rows)
}

#[instrument(skip_all, fields(username = %new_user.username))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    new_user: &NewUser,
    password: &str,
) -> Result<User, AppError> {
    info!("Creating new user");

    if find_user_by_username(pool, &new_user.username).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Username '{}' already exists",
            new_user.username
        )));
    }

    if find_user_by_email(pool, &new_user.email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Email '{}' already exists",
            new_user.email
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let id = new_id();
    let created_at = new_user.created_at.unwrap_or_else(Utc::now);

    sqlx::query(
        "INSERT INTO users (id, username, first_name, last_name, email, password, level, location,
             city, state, education_level, conferences_worked, is_admin, is_evaluator, profile_photo, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.email)
    .bind(&hashed_password)
    .bind(new_user.level.as_str())
    .bind(new_user.location.as_str())
    .bind(&new_user.city)
    .bind(&new_user.state)
    .bind(new_user.education_level.map(|e| e.as_str()))
    .bind(&new_user.conferences_worked)
    .bind(new_user.is_admin)
    .bind(new_user.is_evaluator)
    .bind(&new_user.profile_photo)
    .bind(created_at)
    .execute(pool)
    .await?;

    get_user(pool, &id).await
}

/// Verifies credentials where `login` is either a username or an email address.
#[instrument(skip_all, fields(login))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    login: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");
    // Emails are stored lowercased.
    let (column, login) = if login.contains('@') {
        ("email", login.trim().to_lowercase())
    } else {
        ("username", login.to_string())
    };

    let row = sqlx::query_as::<_, (String, String)>(&format!(
        "SELECT id, password FROM users WHERE {column} = ?"
    ))
    .bind(&login)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((id, hash)) => match bcrypt::verify(password, &hash) {
            Ok(true) => Ok(Some(get_user(pool, &id).await?)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

#[instrument(skip(pool, update))]
pub async fn update_user(
    pool: &Pool<Sqlite>,
    user_id: &str,
    update: UserUpdate,
) -> Result<User, AppError> {
    info!("Updating user");
    let current = get_user(pool, user_id).await?;

    if let Some(username) = &update.username {
        if let Some(existing) = find_user_by_username(pool, username).await? {
            if existing.id != user_id {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
        }
    }

    if let Some(email) = &update.email {
        if let Some(existing) = find_user_by_email(pool, email).await? {
            if existing.id != user_id {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }
    }

    let education_level = update.education_level.or(current.education_level);

    sqlx::query(
        "UPDATE users SET username = ?, first_name = ?, last_name = ?, email = ?, level = ?, location = ?,
             city = ?, state = ?, education_level = ?, conferences_worked = ?, is_admin = ?,
             is_evaluator = ?, profile_photo = ?
         WHERE id = ?",
    )
    .bind(update.username.unwrap_or(current.username))
    .bind(update.first_name.unwrap_or(current.first_name))
    .bind(update.last_name.unwrap_or(current.last_name))
    .bind(update.email.unwrap_or(current.email))
    .bind(update.level.unwrap_or(current.level).as_str())
    .bind(update.location.unwrap_or(current.location).as_str())
    .bind(merge_optional(update.city, current.city))
    .bind(merge_optional(update.state, current.state))
    .bind(education_level.map(|e| e.as_str()))
    .bind(merge_optional(
        update.conferences_worked,
        current.conferences_worked,
    ))
    .bind(update.is_admin.unwrap_or(current.is_admin))
    .bind(update.is_evaluator.unwrap_or(current.is_evaluator))
    .bind(merge_optional(update.profile_photo, current.profile_photo))
    .bind(user_id)
    .execute(pool)
    .await?;

    get_user(pool, user_id).await
}

#[instrument(skip_all, fields(user_id))]
pub async fn update_user_password(
    pool: &Pool<Sqlite>,
    user_id: &str,
    new_password: &str,
) -> Result<(), AppError> {
    info!("Updating user password");
    let hashed_password = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Deletes a user; results, notes, sessions and evaluations go with it through
/// the foreign key cascades.
#[instrument(skip(pool))]
pub async fn delete_user(pool: &Pool<Sqlite>, user_id: &str) -> Result<(), AppError> {
    info!("Deleting user");
    let user = get_user(pool, user_id).await?;

    if user.is_master_admin() {
        return Err(AppError::Authorization(
            "Cannot delete master admin account".to_string(),
        ));
    }

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Seeds the master admin account, or restores its flags if they were removed.
#[instrument(skip_all)]
pub async fn ensure_master_admin(pool: &Pool<Sqlite>, password: &str) -> Result<User, AppError> {
    if let Some(admin) = find_user_by_username(pool, MASTER_ADMIN_USERNAME).await? {
        if admin.is_admin && admin.is_evaluator {
            info!("Master admin account already exists");
            return Ok(admin);
        }

        warn!("Restoring master admin permissions");
        return update_user(
            pool,
            &admin.id,
            UserUpdate {
                is_admin: Some(true),
                is_evaluator: Some(true),
                ..Default::default()
            },
        )
        .await;
    }

    info!("Creating master admin account");
    create_user(
        pool,
        &NewUser {
            username: MASTER_ADMIN_USERNAME.to_string(),
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            email: "admin@umpireperformance.com".to_string(),
            level: Level::TheShow,
            location: Location::Philadelphia,
            city: None,
            state: None,
            education_level: None,
            conferences_worked: None,
            is_admin: true,
            is_evaluator: true,
            profile_photo: None,
            created_at: None,
        },
        password,
    )
    .await
}

#[instrument(skip(executor, result), fields(result_id = %result.id))]
pub async fn add_drill_result<'e, E: SqliteExecutor<'e>>(
    executor: E,
    result: &DrillResult,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO drill_results (id, user_id, drill_type, result, session_id, session_start_time,
             session_end_time, session_notes, evaluator_id, evaluator_username, is_evaluator_recorded, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&result.id)
    .bind(&result.user_id)
    .bind(result.drill_type.as_str())
    .bind(result.result.as_str())
    .bind(&result.session_id)
    .bind(result.session_start_time)
    .bind(result.session_end_time)
    .bind(&result.session_notes)
    .bind(&result.evaluator_id)
    .bind(&result.evaluator_username)
    .bind(result.is_evaluator_recorded)
    .bind(result.timestamp)
    .execute(executor)
    .await?;

    Ok(())
}

fn to_drill_results(rows: Vec<DbDrillResult>) -> Result<Vec<DrillResult>, AppError> {
    rows.into_iter().map(DrillResult::try_from).collect()
}

/// All results in chronological (insertion) order.
#[instrument(skip(pool))]
pub async fn get_drill_results(pool: &Pool<Sqlite>) -> Result<Vec<DrillResult>, AppError> {
    info!("Getting all drill results");
    let rows = sqlx::query_as::<_, DbDrillResult>(
        "SELECT * FROM drill_results ORDER BY timestamp ASC, rowid ASC",
    )
    .fetch_all(pool)
    .await?;

    to_drill_results(rows)
}

/// A user's results in chronological (insertion) order, optionally for one drill.
#[instrument(skip(pool))]
pub async fn get_user_drill_results(
    pool: &Pool<Sqlite>,
    user_id: &str,
    drill_type: Option<DrillType>,
) -> Result<Vec<DrillResult>, AppError> {
    info!("Getting user drill results");
    let rows = match drill_type {
        Some(drill_type) => {
            sqlx::query_as::<_, DbDrillResult>(
                "SELECT * FROM drill_results WHERE user_id = ? AND drill_type = ?
                 ORDER BY timestamp ASC, rowid ASC",
            )
            .bind(user_id)
            .bind(drill_type.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbDrillResult>(
                "SELECT * FROM drill_results WHERE user_id = ? ORDER BY timestamp ASC, rowid ASC",
            )
            .bind(user_id)
            .fetch_all(pool)
            .await?
        }
    };

    to_drill_results(rows)
}

#[instrument(skip(pool))]
pub async fn get_session_drill_results(
    pool: &Pool<Sqlite>,
    session_id: &str,
) -> Result<Vec<DrillResult>, AppError> {
    let rows = sqlx::query_as::<_, DbDrillResult>(
        "SELECT * FROM drill_results WHERE session_id = ? ORDER BY timestamp ASC, rowid ASC",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    to_drill_results(rows)
}

#[instrument(skip(executor))]
pub async fn update_drill_result_outcome<'e, E: SqliteExecutor<'e>>(
    executor: E,
    result_id: &str,
    result: ResultType,
) -> Result<(), AppError> {
    sqlx::query("UPDATE drill_results SET result = ? WHERE id = ?")
        .bind(result.as_str())
        .bind(result_id)
        .execute(executor)
        .await?;

    Ok(())
}

/// Inserts or replaces a drill session row.
#[instrument(skip(executor, session), fields(session_id = %session.id))]
pub async fn save_session<'e, E: SqliteExecutor<'e>>(
    executor: E,
    session: &DrillSession,
) -> Result<(), AppError> {
    let results = serde_json::to_string(&session.results)?;

    sqlx::query(
        "INSERT INTO drill_sessions (id, user_id, drill_type, start_time, end_time, results, notes,
             evaluator_id, evaluator_username, is_evaluator_recorded, is_active)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             user_id = excluded.user_id,
             drill_type = excluded.drill_type,
             start_time = excluded.start_time,
             end_time = excluded.end_time,
             results = excluded.results,
             notes = excluded.notes,
             evaluator_id = excluded.evaluator_id,
             evaluator_username = excluded.evaluator_username,
             is_evaluator_recorded = excluded.is_evaluator_recorded,
             is_active = excluded.is_active",
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(session.drill_type.as_str())
    .bind(session.start_time)
    .bind(session.end_time)
    .bind(results)
    .bind(&session.notes)
    .bind(&session.evaluator_id)
    .bind(&session.evaluator_username)
    .bind(session.is_evaluator_recorded)
    .bind(session.is_active)
    .execute(executor)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_session(pool: &Pool<Sqlite>, session_id: &str) -> Result<DrillSession, AppError> {
    let row = sqlx::query_as::<_, DbDrillSession>("SELECT * FROM drill_sessions WHERE id = ?")
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(session) => DrillSession::try_from(session),
        _ => Err(AppError::NotFound(format!(
            "Drill session {} not found",
            session_id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn get_active_session(
    pool: &Pool<Sqlite>,
    user_id: &str,
) -> Result<Option<DrillSession>, AppError> {
    let row = sqlx::query_as::<_, DbDrillSession>(
        "SELECT * FROM drill_sessions WHERE user_id = ? AND is_active = TRUE
         ORDER BY start_time DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(DrillSession::try_from).transpose()
}

/// Drops any in-progress session of the user. Archived sessions are untouched.
#[instrument(skip(pool))]
pub async fn discard_active_session(pool: &Pool<Sqlite>, user_id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM drill_sessions WHERE user_id = ? AND is_active = TRUE")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Archived sessions of a user, newest first.
#[instrument(skip(pool))]
pub async fn get_user_sessions(
    pool: &Pool<Sqlite>,
    user_id: &str,
) -> Result<Vec<DrillSession>, AppError> {
    let rows = sqlx::query_as::<_, DbDrillSession>(
        "SELECT * FROM drill_sessions WHERE user_id = ? AND is_active = FALSE
         ORDER BY start_time DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DrillSession::try_from).collect()
}

#[instrument(skip(pool))]
pub async fn get_all_sessions(pool: &Pool<Sqlite>) -> Result<Vec<DrillSession>, AppError> {
    let rows = sqlx::query_as::<_, DbDrillSession>(
        "SELECT * FROM drill_sessions WHERE is_active = FALSE ORDER BY start_time DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DrillSession::try_from).collect()
}

#[instrument(skip(executor, note), fields(note_id = %note.id))]
pub async fn add_note<'e, E: SqliteExecutor<'e>>(executor: E, note: &Note) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO notes (id, user_id, username, content, video_url, video_file, likes, comments, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&note.id)
    .bind(&note.user_id)
    .bind(&note.username)
    .bind(&note.content)
    .bind(&note.video_url)
    .bind(&note.video_file)
    .bind(serde_json::to_string(&note.likes)?)
    .bind(serde_json::to_string(&note.comments)?)
    .bind(note.timestamp)
    .execute(executor)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_note(pool: &Pool<Sqlite>, note_id: &str) -> Result<Note, AppError> {
    let row = sqlx::query_as::<_, DbNote>("SELECT * FROM notes WHERE id = ?")
        .bind(note_id)
        .fetch_optional(pool)
        .await?;

    row.map(Note::from)
        .ok_or_else(|| AppError::NotFound(format!("Note {} not found", note_id)))
}

/// A user's journal, newest first.
#[instrument(skip(pool))]
pub async fn get_user_notes(pool: &Pool<Sqlite>, user_id: &str) -> Result<Vec<Note>, AppError> {
    let rows = sqlx::query_as::<_, DbNote>(
        "SELECT * FROM notes WHERE user_id = ? ORDER BY timestamp DESC, rowid DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Note::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_all_notes(pool: &Pool<Sqlite>) -> Result<Vec<Note>, AppError> {
    let rows = sqlx::query_as::<_, DbNote>("SELECT * FROM notes ORDER BY timestamp DESC")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Note::from).collect())
}

#[instrument(skip(pool, content))]
pub async fn update_note(
    pool: &Pool<Sqlite>,
    note_id: &str,
    content: &str,
    video_url: Option<&str>,
) -> Result<Note, AppError> {
    let result = sqlx::query("UPDATE notes SET content = ?, video_url = ? WHERE id = ?")
        .bind(content)
        .bind(video_url)
        .bind(note_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Note {} not found", note_id)));
    }

    get_note(pool, note_id).await
}

#[instrument(skip(pool))]
pub async fn delete_note(pool: &Pool<Sqlite>, note_id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM notes WHERE id = ?")
        .bind(note_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool, evaluation), fields(evaluation_id = %evaluation.id))]
pub async fn add_evaluation(
    pool: &Pool<Sqlite>,
    evaluation: &GameFilmEvaluation,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO game_film_evaluations (id, evaluator_id, evaluator_username, target_user_id,
             target_username, play_type, notes, video_url, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&evaluation.id)
    .bind(&evaluation.evaluator_id)
    .bind(&evaluation.evaluator_username)
    .bind(&evaluation.target_user_id)
    .bind(&evaluation.target_username)
    .bind(&evaluation.play_type)
    .bind(&evaluation.notes)
    .bind(&evaluation.video_url)
    .bind(evaluation.timestamp)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_evaluation(
    pool: &Pool<Sqlite>,
    evaluation_id: &str,
) -> Result<GameFilmEvaluation, AppError> {
    sqlx::query_as::<_, GameFilmEvaluation>("SELECT * FROM game_film_evaluations WHERE id = ?")
        .bind(evaluation_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Evaluation {} not found", evaluation_id)))
}

#[instrument(skip(pool))]
pub async fn get_all_evaluations(
    pool: &Pool<Sqlite>,
) -> Result<Vec<GameFilmEvaluation>, AppError> {
    let rows = sqlx::query_as::<_, GameFilmEvaluation>(
        "SELECT * FROM game_film_evaluations ORDER BY timestamp DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Evaluations written about `user_id`, newest first.
#[instrument(skip(pool))]
pub async fn get_user_evaluations(
    pool: &Pool<Sqlite>,
    user_id: &str,
) -> Result<Vec<GameFilmEvaluation>, AppError> {
    let rows = sqlx::query_as::<_, GameFilmEvaluation>(
        "SELECT * FROM game_film_evaluations WHERE target_user_id = ? ORDER BY timestamp DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[instrument(skip(pool, notes))]
pub async fn update_evaluation(
    pool: &Pool<Sqlite>,
    evaluation_id: &str,
    play_type: &str,
    notes: &str,
    video_url: Option<&str>,
) -> Result<GameFilmEvaluation, AppError> {
    let result = sqlx::query(
        "UPDATE game_film_evaluations SET play_type = ?, notes = ?, video_url = ? WHERE id = ?",
    )
    .bind(play_type)
    .bind(notes)
    .bind(video_url)
    .bind(evaluation_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Evaluation {} not found",
            evaluation_id
        )));
    }

    get_evaluation(pool, evaluation_id).await
}

#[instrument(skip(pool))]
pub async fn delete_evaluation(pool: &Pool<Sqlite>, evaluation_id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM game_film_evaluations WHERE id = ?")
        .bind(evaluation_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    user_id: &str,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<i64, AppError> {
    info!("Creating user session");

    let res = sqlx::query(
        "INSERT INTO user_sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(token)
    .bind(Utc::now())
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<UserSession, AppError> {
    info!("Getting session by token");

    let session = sqlx::query_as::<_, DbUserSession>(
        "SELECT id, user_id, token, created_at, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match session {
        Some(session) => Ok(UserSession::from(session)),
        _ => Err(AppError::Authentication(
            "Invalid session token".to_string(),
        )),
    }
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating session");

    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");

    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
