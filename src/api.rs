use std::sync::MutexGuard;

use chrono::{DateTime, Utc};
use rocket::State;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{Permission, Role, SESSION_COOKIE, User, UserSession};
use crate::db::{self, NewUser, UserUpdate};
use crate::drills::{self, EndedSession};
use crate::env::AppConfig;
use crate::error::AppError;
use crate::local_store::{
    Actor, CleanupReport, IntegrityReport, LegacyStorage, LocalSnapshot, LocalStore, OrphanReport,
};
use crate::migration::{self, MigrationReport};
use crate::models::{
    DrillResult, DrillSession, DrillType, EducationLevel, GameFilmEvaluation, Level, Location,
    Note, ResultType, new_id,
};
use crate::stats::{self, DrillStatsWithRecent, RankingScope, Standing, UserStats};
use crate::validation::{
    AppErrorExt, JsonValidateExt, PermissionCheckExt, ValidationResponse, ValidationResult,
    validate_username,
};

fn legacy(store: &LocalStore) -> Result<MutexGuard<'_, LegacyStorage>, AppError> {
    Ok(store.lock()?)
}

fn parse_drill_type(raw: &str) -> ValidationResult<DrillType> {
    raw.parse::<DrillType>().validate_custom()
}

#[derive(Serialize, Debug)]
pub struct UserData {
    #[serde(flatten)]
    pub user: User,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        let mut permissions: Vec<Permission> = crate::auth::permissions_for(
            user.is_admin,
            user.is_evaluator,
        )
        .iter()
        .copied()
        .collect();
        permissions.sort_by_key(|p| format!("{:?}", p));

        Self {
            role: user.role(),
            permissions,
            user,
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email address.
    #[validate(length(min = 1, message = "Username or email is required"))]
    username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<UserData>,
    pub error: Option<String>,
}

async fn start_login_session(
    db: &Pool<Sqlite>,
    config: &AppConfig,
    cookies: &CookieJar<'_>,
    user: &User,
) -> Result<(), AppError> {
    let token = UserSession::generate_token();
    let expires_at = Utc::now() + chrono::Duration::hours(config.session_hours);

    db::create_user_session(db, &user.id, &token, expires_at).await?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .same_site(SameSite::Lax)
        .http_only(true)
        .max_age(rocket::time::Duration::hours(config.session_hours));
    cookies.add_private(cookie);

    Ok(())
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ValidationResult<Json<LoginResponse>> {
    let validated = login.validate_custom()?;

    match db::authenticate_user(db, validated.username.trim(), &validated.password)
        .await
        .validate_custom()?
    {
        Some(user) => {
            start_login_session(db, config, cookies, &user)
                .await
                .validate_custom()?;
            info!(username = %user.username, "User logged in");

            Ok(Json(LoginResponse {
                success: true,
                user: Some(UserData::from(user)),
                error: None,
            }))
        }
        None => {
            warn!(login = %validated.username, "Failed login attempt");
            Ok(Json(LoginResponse {
                success: false,
                user: None,
                error: Some("Invalid username or password".to_string()),
            }))
        }
    }
}

#[derive(Deserialize, Validate, Clone)]
pub struct SignupRequest {
    #[validate(custom(function = "validate_username"))]
    username: String,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    last_name: String,
    #[validate(email(message = "A valid email address is required"))]
    email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
    level: Option<Level>,
    location: Option<Location>,
    city: Option<String>,
    state: Option<String>,
    education_level: Option<EducationLevel>,
    conferences_worked: Option<String>,
}

impl SignupRequest {
    fn to_new_user(&self, is_admin: bool, is_evaluator: bool) -> NewUser {
        NewUser {
            username: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            level: self.level.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            city: self.city.clone().filter(|c| !c.trim().is_empty()),
            state: self.state.clone().filter(|s| !s.trim().is_empty()),
            education_level: self.education_level,
            conferences_worked: self
                .conferences_worked
                .clone()
                .filter(|c| !c.trim().is_empty()),
            is_admin,
            is_evaluator,
            profile_photo: None,
            created_at: None,
        }
    }
}

/// Self-service registration. New accounts are trainees and are logged in
/// straight away.
#[post("/signup", data = "<signup>")]
pub async fn api_signup(
    signup: Json<SignupRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ValidationResult<Custom<Json<LoginResponse>>> {
    let validated = signup.validate_custom()?;

    let user = db::create_user(db, &validated.to_new_user(false, false), &validated.password)
        .await
        .validate_custom()?;

    start_login_session(db, config, cookies, &user)
        .await
        .validate_custom()?;
    info!(username = %user.username, "User signed up");

    Ok(Custom(
        Status::Created,
        Json(LoginResponse {
            success: true,
            user: Some(UserData::from(user)),
            error: None,
        }),
    ))
}

#[get("/me")]
pub async fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[get("/me", rank = 2)]
pub async fn api_me_unauthorized() -> Status {
    Status::Unauthorized
}

#[post("/logout")]
pub async fn api_logout(cookies: &CookieJar<'_>, db: &State<Pool<Sqlite>>) -> Status {
    let token = cookies
        .get_private(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        if let Err(err) = db::invalidate_session(db, &token).await {
            err.log_and_record("Logout");
        }
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE));
    Status::Ok
}

#[derive(Deserialize, Validate, Clone, Default)]
pub struct ProfileUpdateRequest {
    #[validate(custom(function = "validate_username"))]
    username: Option<String>,
    #[validate(length(min = 1, max = 100))]
    first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    last_name: Option<String>,
    #[validate(email(message = "A valid email address is required"))]
    email: Option<String>,
    level: Option<Level>,
    location: Option<Location>,
    city: Option<String>,
    state: Option<String>,
    education_level: Option<EducationLevel>,
    conferences_worked: Option<String>,
    profile_photo: Option<String>,
}

impl ProfileUpdateRequest {
    fn into_update(self) -> UserUpdate {
        UserUpdate {
            username: self.username.map(|u| u.trim().to_string()),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email.map(|e| e.trim().to_lowercase()),
            level: self.level,
            location: self.location,
            city: self.city,
            state: self.state,
            education_level: self.education_level,
            conferences_worked: self.conferences_worked,
            is_admin: None,
            is_evaluator: None,
            profile_photo: self.profile_photo,
        }
    }
}

fn ensure_master_username_kept(target: &User, username: Option<&str>) -> Result<(), AppError> {
    match username {
        Some(new_name) if target.is_master_admin() && new_name != target.username => Err(
            AppError::Validation("The master admin username cannot be changed".to_string()),
        ),
        _ => Ok(()),
    }
}

#[put("/profile", data = "<profile>")]
pub async fn api_update_profile(
    profile: Json<ProfileUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<User>> {
    user.check_permission(Permission::EditOwnProfile)?;
    let validated = profile.validate_custom()?;
    ensure_master_username_kept(&user, validated.username.as_deref()).validate_custom()?;

    let updated = db::update_user(db, &user.id, validated.into_update())
        .await
        .validate_custom()?;

    Ok(Json(updated))
}

#[derive(Deserialize, Validate)]
pub struct PasswordChangeRequest {
    current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    new_password: String,
}

#[post("/change-password", data = "<password>")]
pub async fn api_change_password(
    password: Json<PasswordChangeRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Status> {
    let validated = password.validate_custom()?;

    let is_valid = db::authenticate_user(db, &user.username, &validated.current_password)
        .await
        .validate_custom()?;

    match is_valid {
        Some(_) => {
            db::update_user_password(db, &user.id, &validated.new_password)
                .await
                .validate_custom()?;

            Ok(Status::Ok)
        }
        _ => Err(Custom(
            Status::Unauthorized,
            Json(ValidationResponse::with_error(
                "current_password",
                "Current password is incorrect",
            )),
        )),
    }
}

#[derive(Serialize)]
pub struct DrillInfo {
    pub drill_type: DrillType,
    pub label: &'static str,
}

#[get("/drills")]
pub fn api_get_drills(_user: User) -> Json<Vec<DrillInfo>> {
    Json(
        DrillType::ALL
            .iter()
            .map(|drill| DrillInfo {
                drill_type: *drill,
                label: drill.label(),
            })
            .collect(),
    )
}

#[get("/users/<id>/results?<drill_type>")]
pub async fn api_get_user_results(
    id: &str,
    drill_type: Option<&str>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<Vec<DrillResult>>> {
    user.check_self_or(id, Permission::ViewAllUsers)?;
    let drill_type = drill_type.map(parse_drill_type).transpose()?;

    let results = db::get_user_drill_results(db, id, drill_type)
        .await
        .validate_custom()?;

    Ok(Json(results))
}

#[derive(Serialize)]
pub struct DrillBreakdown {
    pub drill_type: DrillType,
    pub label: &'static str,
    pub stats: DrillStatsWithRecent,
}

#[derive(Serialize)]
pub struct UserStatsResponse {
    pub user_id: String,
    pub overall: DrillStatsWithRecent,
    pub drills: Vec<DrillBreakdown>,
}

#[get("/users/<id>/stats?<drill_type>")]
pub async fn api_get_user_stats(
    id: &str,
    drill_type: Option<&str>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<UserStatsResponse>> {
    user.check_self_or(id, Permission::ViewAllUsers)?;
    let drill_type = drill_type.map(parse_drill_type).transpose()?;

    let target = db::get_user(db, id).await.validate_custom()?;
    let results = db::get_user_drill_results(db, &target.id, drill_type)
        .await
        .validate_custom()?;

    let outcomes: Vec<ResultType> = results.iter().map(|r| r.result).collect();
    let drill_types: Vec<DrillType> = match drill_type {
        Some(drill) => vec![drill],
        None => DrillType::ALL.to_vec(),
    };

    let drills = drill_types
        .into_iter()
        .map(|drill| {
            let of_drill: Vec<ResultType> = results
                .iter()
                .filter(|r| r.drill_type == drill)
                .map(|r| r.result)
                .collect();

            DrillBreakdown {
                drill_type: drill,
                label: drill.label(),
                stats: stats::calculate_drill_stats_with_recent(&of_drill),
            }
        })
        .collect();

    Ok(Json(UserStatsResponse {
        user_id: target.id,
        overall: stats::calculate_drill_stats_with_recent(&outcomes),
        drills,
    }))
}

#[derive(Deserialize)]
pub struct BeginSessionRequest {
    drill_type: DrillType,
    /// Trainee to record for; defaults to the caller.
    user_id: Option<String>,
}

#[post("/sessions", data = "<request>")]
pub async fn api_begin_session(
    request: Json<BeginSessionRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Custom<Json<DrillSession>>> {
    let session = match request.user_id.as_deref() {
        Some(trainee_id) if trainee_id != user.id => {
            user.check_permission(Permission::RecordDrillsForOthers)?;
            let trainee = db::get_user(db, trainee_id).await.validate_custom()?;
            drills::begin_session(db, &trainee, request.drill_type, Some(&user)).await
        }
        _ => {
            user.check_permission(Permission::RecordOwnDrills)?;
            drills::begin_session(db, &user, request.drill_type, None).await
        }
    }
    .validate_custom()?;

    Ok(Custom(Status::Created, Json(session)))
}

#[get("/sessions/active?<user_id>")]
pub async fn api_get_active_session(
    user_id: Option<&str>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<Option<DrillSession>>> {
    let owner = user_id.unwrap_or(&user.id);
    user.check_self_or(owner, Permission::RecordDrillsForOthers)?;

    let session = db::get_active_session(db, owner).await.validate_custom()?;
    Ok(Json(session))
}

#[derive(Deserialize)]
pub struct RecordResultRequest {
    result: ResultType,
}

#[post("/sessions/<id>/results", data = "<request>")]
pub async fn api_record_result(
    id: &str,
    request: Json<RecordResultRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<DrillSession>> {
    let session = drills::record_result(db, &user, id, request.result)
        .await
        .validate_custom()?;

    Ok(Json(session))
}

#[derive(Deserialize, Default)]
pub struct EndSessionRequest {
    notes: Option<String>,
}

#[post("/sessions/<id>/end", data = "<request>")]
pub async fn api_end_session(
    id: &str,
    request: Option<Json<EndSessionRequest>>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<EndedSession>> {
    let notes = request.and_then(|r| r.into_inner().notes);

    let ended = drills::end_session(db, &user, id, notes)
        .await
        .validate_custom()?;

    Ok(Json(ended))
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

#[delete("/sessions/active?<user_id>")]
pub async fn api_cancel_session(
    user_id: Option<&str>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<CancelResponse>> {
    let owner = user_id.unwrap_or(&user.id);
    user.check_self_or(owner, Permission::RecordDrillsForOthers)?;

    let cancelled = drills::cancel_session(db, owner).await.validate_custom()?;
    Ok(Json(CancelResponse { cancelled }))
}

#[get("/users/<id>/sessions")]
pub async fn api_get_user_sessions(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<DrillSession>>, Status> {
    user.require_self_or(id, Permission::ViewAllUsers)?;

    Ok(Json(db::get_user_sessions(db, id).await?))
}

#[put("/admin/sessions/<id>/results/<index>", data = "<request>")]
pub async fn api_update_session_result(
    id: &str,
    index: usize,
    request: Json<RecordResultRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<DrillSession>> {
    let session = drills::update_session_result(db, &user, id, index, request.result)
        .await
        .validate_custom()?;

    Ok(Json(session))
}

async fn ranking_inputs(db: &Pool<Sqlite>) -> Result<(Vec<User>, Vec<DrillResult>), AppError> {
    Ok((db::get_all_users(db).await?, db::get_drill_results(db).await?))
}

#[get("/leaderboard")]
pub async fn api_leaderboard(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<Vec<UserStats>>> {
    user.check_permission(Permission::ViewLeaderboards)?;
    let (users, results) = ranking_inputs(db).await.validate_custom()?;

    Ok(Json(stats::leaderboard(&users, &results)))
}

#[get("/leaderboard/<drill_type>")]
pub async fn api_drill_leaderboard(
    drill_type: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<Vec<UserStats>>> {
    user.check_permission(Permission::ViewLeaderboards)?;
    let drill_type = parse_drill_type(drill_type)?;
    let (users, results) = ranking_inputs(db).await.validate_custom()?;

    Ok(Json(stats::drill_leaderboard(&users, &results, drill_type)))
}

#[get("/leaderboard/<drill_type>/last20")]
pub async fn api_drill_last20_leaderboard(
    drill_type: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<Vec<UserStats>>> {
    user.check_permission(Permission::ViewLeaderboards)?;
    let drill_type = parse_drill_type(drill_type)?;
    let (users, results) = ranking_inputs(db).await.validate_custom()?;

    Ok(Json(stats::drill_last20_leaderboard(
        &users, &results, drill_type,
    )))
}

#[derive(Serialize)]
pub struct DrillStanding {
    pub drill_type: DrillType,
    pub overall: Standing,
    pub last20: Standing,
}

#[derive(Serialize)]
pub struct MyStandings {
    pub overall: Standing,
    pub drills: Vec<DrillStanding>,
}

#[get("/leaderboard/me")]
pub async fn api_my_standing(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<MyStandings>> {
    user.check_permission(Permission::ViewLeaderboards)?;
    let (users, results) = ranking_inputs(db).await.validate_custom()?;

    let drills = DrillType::ALL
        .iter()
        .map(|&drill_type| DrillStanding {
            drill_type,
            overall: stats::standing(&user, &users, &results, RankingScope::Drill(drill_type)),
            last20: stats::standing(
                &user,
                &users,
                &results,
                RankingScope::DrillRecent(drill_type),
            ),
        })
        .collect();

    Ok(Json(MyStandings {
        overall: stats::standing(&user, &users, &results, RankingScope::Overall),
        drills,
    }))
}

#[get("/users/<id>/notes")]
pub async fn api_get_user_notes(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Note>>, Status> {
    user.require_self_or(id, Permission::ViewAllUsers)?;

    Ok(Json(db::get_user_notes(db, id).await?))
}

#[derive(Deserialize, Validate)]
pub struct NoteRequest {
    #[validate(length(min = 1, message = "Note content is required"))]
    content: String,
    #[validate(url(message = "Video link must be a valid URL"))]
    video_url: Option<String>,
    /// Base64-encoded clip.
    video_file: Option<String>,
}

#[post("/notes", data = "<request>")]
pub async fn api_create_note(
    request: Json<NoteRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Custom<Json<Note>>> {
    user.check_permission(Permission::ManageOwnNotes)?;
    let validated = request.validate_custom()?;

    let note = Note {
        id: new_id(),
        user_id: user.id.clone(),
        username: user.username.clone(),
        content: validated.content,
        video_url: validated.video_url.filter(|u| !u.is_empty()),
        video_file: validated.video_file.filter(|f| !f.is_empty()),
        timestamp: Utc::now(),
        likes: Vec::new(),
        comments: Vec::new(),
    };

    db::add_note(&**db, &note).await.validate_custom()?;
    Ok(Custom(Status::Created, Json(note)))
}

async fn owned_note(db: &Pool<Sqlite>, user: &User, note_id: &str) -> Result<Note, AppError> {
    let note = db::get_note(db, note_id).await?;
    user.require_self_or(&note.user_id, Permission::ManageData)?;
    Ok(note)
}

#[put("/notes/<id>", data = "<request>")]
pub async fn api_update_note(
    id: &str,
    request: Json<NoteRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<Note>> {
    let validated = request.validate_custom()?;
    owned_note(db, &user, id).await.validate_custom()?;

    let note = db::update_note(db, id, &validated.content, validated.video_url.as_deref())
        .await
        .validate_custom()?;

    Ok(Json(note))
}

#[delete("/notes/<id>")]
pub async fn api_delete_note(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Status> {
    owned_note(db, &user, id).await.validate_custom()?;
    db::delete_note(db, id).await.validate_custom()?;

    Ok(Status::NoContent)
}

#[get("/evaluations")]
pub async fn api_get_evaluations(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<GameFilmEvaluation>>, Status> {
    user.require_permission(Permission::ViewAllUsers)?;

    Ok(Json(db::get_all_evaluations(db).await?))
}

#[get("/users/<id>/evaluations")]
pub async fn api_get_user_evaluations(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<GameFilmEvaluation>>, Status> {
    user.require_self_or(id, Permission::ViewAllUsers)?;

    Ok(Json(db::get_user_evaluations(db, id).await?))
}

#[derive(Deserialize, Validate)]
pub struct EvaluationRequest {
    target_user_id: String,
    #[validate(length(min = 1, message = "Play type is required"))]
    play_type: String,
    #[validate(length(min = 1, message = "Evaluation notes are required"))]
    notes: String,
    #[validate(url(message = "Video link must be a valid URL"))]
    video_url: Option<String>,
}

#[post("/evaluations", data = "<request>")]
pub async fn api_create_evaluation(
    request: Json<EvaluationRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Custom<Json<GameFilmEvaluation>>> {
    user.check_permission(Permission::ManageEvaluations)?;
    let validated = request.validate_custom()?;

    let target = db::get_user(db, &validated.target_user_id)
        .await
        .validate_custom()?;

    let evaluation = GameFilmEvaluation {
        id: new_id(),
        evaluator_id: user.id.clone(),
        evaluator_username: user.username.clone(),
        target_user_id: target.id,
        target_username: target.username,
        play_type: validated.play_type,
        notes: validated.notes,
        video_url: validated.video_url.filter(|u| !u.is_empty()),
        timestamp: Utc::now(),
    };

    db::add_evaluation(db, &evaluation).await.validate_custom()?;
    Ok(Custom(Status::Created, Json(evaluation)))
}

#[derive(Deserialize, Validate)]
pub struct EvaluationUpdateRequest {
    #[validate(length(min = 1, message = "Play type is required"))]
    play_type: String,
    #[validate(length(min = 1, message = "Evaluation notes are required"))]
    notes: String,
    #[validate(url(message = "Video link must be a valid URL"))]
    video_url: Option<String>,
}

async fn authored_evaluation(
    db: &Pool<Sqlite>,
    user: &User,
    evaluation_id: &str,
) -> Result<GameFilmEvaluation, AppError> {
    user.require_permission(Permission::ManageEvaluations)?;
    let evaluation = db::get_evaluation(db, evaluation_id).await?;
    user.require_self_or(&evaluation.evaluator_id, Permission::ManageData)?;
    Ok(evaluation)
}

#[put("/evaluations/<id>", data = "<request>")]
pub async fn api_update_evaluation(
    id: &str,
    request: Json<EvaluationUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<GameFilmEvaluation>> {
    let validated = request.validate_custom()?;
    authored_evaluation(db, &user, id).await.validate_custom()?;

    let evaluation = db::update_evaluation(
        db,
        id,
        &validated.play_type,
        &validated.notes,
        validated.video_url.as_deref(),
    )
    .await
    .validate_custom()?;

    Ok(Json(evaluation))
}

#[delete("/evaluations/<id>")]
pub async fn api_delete_evaluation(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Status> {
    authored_evaluation(db, &user, id).await.validate_custom()?;
    db::delete_evaluation(db, id).await.validate_custom()?;

    Ok(Status::NoContent)
}

#[get("/users")]
pub async fn api_get_all_users(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<User>>, Status> {
    user.require_permission(Permission::ViewAllUsers)?;

    Ok(Json(db::get_all_users(db).await?))
}

#[derive(Deserialize, Validate, Clone)]
pub struct AdminCreateUserRequest {
    #[serde(flatten)]
    #[validate(nested)]
    profile: SignupRequest,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    is_evaluator: bool,
}

#[post("/admin/users", data = "<request>")]
pub async fn api_admin_create_user(
    request: Json<AdminCreateUserRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Custom<Json<User>>> {
    user.check_permission(Permission::CreateUsers)?;
    let validated = request.validate_custom()?;

    let created = db::create_user(
        db,
        &validated
            .profile
            .to_new_user(validated.is_admin, validated.is_evaluator),
        &validated.profile.password,
    )
    .await
    .validate_custom()?;

    info!(created = %created.username, by = %user.username, "Admin created user");
    Ok(Custom(Status::Created, Json(created)))
}

#[derive(Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[serde(flatten)]
    #[validate(nested)]
    profile: ProfileUpdateRequest,
    is_admin: Option<bool>,
    is_evaluator: Option<bool>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: Option<String>,
}

#[put("/admin/users/<id>", data = "<request>")]
pub async fn api_admin_update_user(
    id: &str,
    request: Json<AdminUpdateUserRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<User>> {
    user.check_permission(Permission::EditUsers)?;
    let validated = request.validate_custom()?;

    let target = db::get_user(db, id).await.validate_custom()?;
    ensure_master_username_kept(&target, validated.profile.username.as_deref())
        .validate_custom()?;

    let mut update = validated.profile.into_update();
    if target.is_master_admin() {
        update.is_admin = Some(true);
        update.is_evaluator = Some(true);
    } else {
        update.is_admin = validated.is_admin;
        update.is_evaluator = validated.is_evaluator;
    }

    let updated = db::update_user(db, id, update).await.validate_custom()?;

    if let Some(password) = &validated.password {
        db::update_user_password(db, id, password)
            .await
            .validate_custom()?;
    }

    Ok(Json(updated))
}

#[delete("/admin/users/<id>")]
pub async fn api_admin_delete_user(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Status> {
    user.check_permission(Permission::DeleteUsers)?;
    db::delete_user(db, id).await.validate_custom()?;

    info!(deleted = %id, by = %user.username, "Admin deleted user");
    Ok(Status::NoContent)
}

#[derive(Serialize)]
pub struct DataExport {
    pub users: Vec<User>,
    pub drill_results: Vec<DrillResult>,
    pub notes: Vec<Note>,
    pub sessions: Vec<DrillSession>,
    pub evaluations: Vec<GameFilmEvaluation>,
    pub export_date: DateTime<Utc>,
}

#[get("/admin/export")]
pub async fn api_export(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<DataExport>> {
    user.check_permission(Permission::ManageData)?;

    let export = async {
        Ok::<_, AppError>(DataExport {
            users: db::get_all_users(db).await?,
            drill_results: db::get_drill_results(db).await?,
            notes: db::get_all_notes(db).await?,
            sessions: db::get_all_sessions(db).await?,
            evaluations: db::get_all_evaluations(db).await?,
            export_date: Utc::now(),
        })
    }
    .await
    .validate_custom()?;

    Ok(Json(export))
}

#[post("/admin/migrate")]
pub async fn api_migrate(
    user: User,
    db: &State<Pool<Sqlite>>,
    store: &State<LocalStore>,
) -> ValidationResult<Json<MigrationReport>> {
    user.check_permission(Permission::ManageData)?;

    let report = migration::migrate_from_store(db, store)
        .await
        .validate_custom()?;

    Ok(Json(report))
}

#[get("/admin/local/export")]
pub fn api_local_export(
    user: User,
    store: &State<LocalStore>,
) -> ValidationResult<Json<LocalSnapshot>> {
    user.check_permission(Permission::ManageData)?;

    let snapshot = legacy(store)
        .and_then(|mut legacy| legacy.export_all_data())
        .validate_custom()?;

    Ok(Json(snapshot))
}

#[post("/admin/local/import", data = "<payload>")]
pub fn api_local_import(
    payload: String,
    user: User,
    store: &State<LocalStore>,
) -> ValidationResult<Status> {
    user.check_permission(Permission::ManageData)?;

    legacy(store)
        .and_then(|mut legacy| legacy.import_data(&payload, Actor::Verified))
        .validate_custom()?;

    Ok(Status::Ok)
}

#[get("/admin/local/integrity")]
pub fn api_local_integrity(
    user: User,
    store: &State<LocalStore>,
) -> ValidationResult<Json<IntegrityReport>> {
    user.check_permission(Permission::ManageData)?;

    let report = legacy(store)
        .and_then(|mut legacy| legacy.check_data_integrity())
        .validate_custom()?;

    Ok(Json(report))
}

#[get("/admin/local/orphans")]
pub fn api_local_orphans(
    user: User,
    store: &State<LocalStore>,
) -> ValidationResult<Json<OrphanReport>> {
    user.check_permission(Permission::ManageData)?;

    let report = legacy(store)
        .and_then(|mut legacy| legacy.get_orphaned_data())
        .validate_custom()?;

    Ok(Json(report))
}

#[post("/admin/local/cleanup")]
pub fn api_local_cleanup(
    user: User,
    store: &State<LocalStore>,
) -> ValidationResult<Json<CleanupReport>> {
    user.check_permission(Permission::ManageData)?;

    let report = legacy(store)
        .and_then(|mut legacy| legacy.cleanup_orphaned_data(Actor::Verified))
        .validate_custom()?;

    Ok(Json(report))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
