//! Records as they are laid out in the legacy store: camelCase JSON, optional
//! fields omitted rather than null, plaintext passwords.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::NewUser;
use crate::models::{
    DrillResult, DrillSession, DrillType, EducationLevel, GameFilmEvaluation, Level, Location,
    Note, ResultType,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalUser {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_level: Option<EducationLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conferences_worked: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_evaluator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LocalUser {
    /// Profile for the relational store. The id is left for the store to assign.
    pub fn to_new_user(&self) -> NewUser {
        NewUser {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            level: self.level,
            location: self.location,
            city: self.city.clone(),
            state: self.state.clone(),
            education_level: self.education_level,
            conferences_worked: self.conferences_worked.clone(),
            is_admin: self.is_admin,
            is_evaluator: self.is_evaluator,
            profile_photo: self.profile_photo.clone(),
            created_at: Some(self.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalDrillResult {
    pub id: String,
    pub user_id: String,
    pub drill_type: DrillType,
    pub result: ResultType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator_username: Option<String>,
    #[serde(default)]
    pub is_evaluator_recorded: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<LocalDrillResult> for DrillResult {
    fn from(local: LocalDrillResult) -> Self {
        Self {
            id: local.id,
            user_id: local.user_id,
            drill_type: local.drill_type,
            result: local.result,
            session_id: local.session_id,
            session_start_time: local.session_start_time,
            session_end_time: local.session_end_time,
            session_notes: local.session_notes,
            evaluator_id: local.evaluator_id,
            evaluator_username: local.evaluator_username,
            is_evaluator_recorded: local.is_evaluator_recorded,
            timestamp: local.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalDrillSession {
    pub id: String,
    pub user_id: String,
    pub drill_type: DrillType,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Vec<ResultType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator_username: Option<String>,
    #[serde(default)]
    pub is_evaluator_recorded: bool,
    #[serde(default)]
    pub is_active: bool,
}

impl From<LocalDrillSession> for DrillSession {
    fn from(local: LocalDrillSession) -> Self {
        Self {
            id: local.id,
            user_id: local.user_id,
            drill_type: local.drill_type,
            start_time: local.start_time,
            end_time: local.end_time,
            results: local.results,
            notes: local.notes,
            evaluator_id: local.evaluator_id,
            evaluator_username: local.evaluator_username,
            is_evaluator_recorded: local.is_evaluator_recorded,
            is_active: local.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalNote {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<serde_json::Value>,
}

impl From<LocalNote> for Note {
    fn from(local: LocalNote) -> Self {
        Self {
            id: local.id,
            user_id: local.user_id,
            username: local.username,
            content: local.content,
            video_url: local.video_url,
            video_file: local.video_file,
            timestamp: local.timestamp,
            likes: local.likes,
            comments: local.comments,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalEvaluation {
    pub id: String,
    pub evaluator_id: String,
    pub evaluator_username: String,
    pub target_user_id: String,
    pub target_username: String,
    pub play_type: String,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<LocalEvaluation> for GameFilmEvaluation {
    fn from(local: LocalEvaluation) -> Self {
        Self {
            id: local.id,
            evaluator_id: local.evaluator_id,
            evaluator_username: local.evaluator_username,
            target_user_id: local.target_user_id,
            target_username: local.target_username,
            play_type: local.play_type,
            notes: local.notes,
            video_url: local.video_url,
            timestamp: local.timestamp,
        }
    }
}
