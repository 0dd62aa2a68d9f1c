use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;

use crate::error::AppError;
use crate::models::{EducationLevel, Level, Location};

use super::{Permission, Role, permissions_for};

pub const MASTER_ADMIN_USERNAME: &str = "umpireperformance";

const TOKEN_LENGTH: usize = 64;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct User {
    pub id: String,
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
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub level: String,
    pub location: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub education_level: Option<String>,
    pub conferences_worked: Option<String>,
    pub is_admin: bool,
    pub is_evaluator: bool,
    pub profile_photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(user: DbUser) -> Result<Self, Self::Error> {
        let education_level = match user.education_level.as_deref() {
            Some(level) if !level.is_empty() => Some(level.parse()?),
            _ => None,
        };

        Ok(Self {
            level: user.level.parse()?,
            location: user.location.parse()?,
            education_level,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            city: user.city,
            state: user.state,
            conferences_worked: user.conferences_worked,
            is_admin: user.is_admin,
            is_evaluator: user.is_evaluator,
            profile_photo: user.profile_photo,
            created_at: user.created_at,
        })
    }
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_flags(self.is_admin, self.is_evaluator)
    }

    pub fn is_master_admin(&self) -> bool {
        self.username == MASTER_ADMIN_USERNAME
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        permissions_for(self.is_admin, self.is_evaluator).contains(&permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                role = %self.role(),
                permission = ?permission,
                "Permission denied"
            );
            Err(AppError::Authorization(format!(
                "{} lacks {:?}",
                self.username, permission
            )))
        }
    }

    /// Allows access to `owner_id`'s data for the owner, or for anyone holding `permission`.
    pub fn require_self_or(&self, owner_id: &str, permission: Permission) -> Result<(), AppError> {
        if self.id == owner_id {
            return Ok(());
        }
        self.require_permission(permission)
    }
}

#[derive(Debug, Clone)]
pub struct UserSession {
    pub id: i64,
    pub user_id: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUserSession {
    pub id: i64,
    pub user_id: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<DbUserSession> for UserSession {
    fn from(session: DbUserSession) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            token: session.token,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

impl UserSession {
    pub fn generate_token() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now()
    }
}
