use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::db::{get_session_by_token, get_user};

use super::User;

pub const SESSION_COOKIE: &str = "session_token";

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("user_auth_guard");
        let _guard = auth_span.enter();

        let token = request
            .cookies()
            .get_private(SESSION_COOKIE)
            .map(|c| c.value().to_string());

        let Some(token) = token else {
            return Outcome::Error((Status::Unauthorized, ()));
        };

        let db = match request.rocket().state::<SqlitePool>() {
            Some(pool) => pool,
            _ => {
                tracing::error!("Database pool not found in managed state");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        match get_session_by_token(db, &token).await {
            Ok(session) => {
                if !session.is_valid() {
                    tracing::warn!(user_id = %session.user_id, "Session token expired");
                    return Outcome::Error((Status::Unauthorized, ()));
                }

                match get_user(db, &session.user_id).await {
                    Ok(user) => {
                        tracing::info!(username = %user.username, role = %user.role(), "User authenticated via session token");
                        Outcome::Success(user)
                    }
                    Err(err) => {
                        tracing::error!(user_id = %session.user_id, error = ?err, "Failed to fetch user for valid session");
                        Outcome::Error((Status::Unauthorized, ()))
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = ?err, "Invalid session token");
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> Custom<Json<Value>> {
    let error_json = json!({
        "error": "Unauthorized",
        "message": "Authentication required"
    });

    Custom(Status::Unauthorized, Json(error_json))
}

#[catch(403)]
pub fn forbidden_api(_req: &Request) -> Custom<Json<Value>> {
    tracing::warn!("Forbidden access attempt");
    let error_json = json!({
        "error": "Forbidden",
        "message": "You don't have permission to perform this action"
    });

    Custom(Status::Forbidden, Json(error_json))
}
