use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillType {
    AudioForcePlay,
    ForcePlayReplay,
    CheckSwing,
    CheckSwingMiddle,
    #[serde(rename = "pick_off_1b")]
    PickOff1b,
    #[serde(rename = "steal_2b")]
    Steal2b,
    #[serde(rename = "steal_3b")]
    Steal3b,
    FairFoul,
    PlayAtPlate,
    #[serde(rename = "plays_at_1b_advanced")]
    PlaysAt1bAdvanced,
    ForcePlaysMiddle,
}

impl DrillType {
    pub const ALL: [DrillType; 11] = [
        DrillType::AudioForcePlay,
        DrillType::ForcePlayReplay,
        DrillType::CheckSwing,
        DrillType::CheckSwingMiddle,
        DrillType::PickOff1b,
        DrillType::Steal2b,
        DrillType::Steal3b,
        DrillType::FairFoul,
        DrillType::PlayAtPlate,
        DrillType::PlaysAt1bAdvanced,
        DrillType::ForcePlaysMiddle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DrillType::AudioForcePlay => "audio_force_play",
            DrillType::ForcePlayReplay => "force_play_replay",
            DrillType::CheckSwing => "check_swing",
            DrillType::CheckSwingMiddle => "check_swing_middle",
            DrillType::PickOff1b => "pick_off_1b",
            DrillType::Steal2b => "steal_2b",
            DrillType::Steal3b => "steal_3b",
            DrillType::FairFoul => "fair_foul",
            DrillType::PlayAtPlate => "play_at_plate",
            DrillType::PlaysAt1bAdvanced => "plays_at_1b_advanced",
            DrillType::ForcePlaysMiddle => "force_plays_middle",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrillType::AudioForcePlay => "Audio Force Play",
            DrillType::ForcePlayReplay => "Force Play Replay",
            DrillType::CheckSwing => "Check Swing",
            DrillType::CheckSwingMiddle => "Check Swing Middle",
            DrillType::PickOff1b => "Pick Off 1B",
            DrillType::Steal2b => "Steal 2B",
            DrillType::Steal3b => "Steal 3B",
            DrillType::FairFoul => "Fair/Foul",
            DrillType::PlayAtPlate => "Play at Plate",
            DrillType::PlaysAt1bAdvanced => "Plays at 1B Advanced",
            DrillType::ForcePlaysMiddle => "Force Plays Middle",
        }
    }
}

impl FromStr for DrillType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DrillType::ALL
            .iter()
            .find(|d| d.as_str() == s)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("Unknown drill type: {}", s)))
    }
}

impl fmt::Display for DrillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Confirmed,
    Stands,
    Overturned,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Confirmed => "confirmed",
            ResultType::Stands => "stands",
            ResultType::Overturned => "overturned",
        }
    }
}

impl FromStr for ResultType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ResultType::Confirmed),
            "stands" => Ok(ResultType::Stands),
            "overturned" => Ok(ResultType::Overturned),
            _ => Err(AppError::Validation(format!("Unknown result: {}", s))),
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Level {
    #[default]
    #[serde(rename = "rookie")]
    Rookie,
    #[serde(rename = "AA")]
    DoubleA,
    #[serde(rename = "AAA")]
    TripleA,
    #[serde(rename = "The Show")]
    TheShow,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Rookie => "rookie",
            Level::DoubleA => "AA",
            Level::TripleA => "AAA",
            Level::TheShow => "The Show",
        }
    }
}

impl FromStr for Level {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rookie" => Ok(Level::Rookie),
            "AA" => Ok(Level::DoubleA),
            "AAA" => Ok(Level::TripleA),
            "The Show" => Ok(Level::TheShow),
            _ => Err(AppError::Validation(format!("Unknown level: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Location {
    #[default]
    Philadelphia,
    Seattle,
    #[serde(rename = "Mobile Camp")]
    MobileCamp,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Philadelphia => "Philadelphia",
            Location::Seattle => "Seattle",
            Location::MobileCamp => "Mobile Camp",
        }
    }
}

impl FromStr for Location {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Philadelphia" => Ok(Location::Philadelphia),
            "Seattle" => Ok(Location::Seattle),
            "Mobile Camp" => Ok(Location::MobileCamp),
            _ => Err(AppError::Validation(format!("Unknown location: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EducationLevel {
    Youth,
    #[serde(rename = "High School")]
    HighSchool,
    #[serde(rename = "NAIA")]
    Naia,
    #[serde(rename = "NCAA D1")]
    NcaaD1,
    #[serde(rename = "NCAA D2")]
    NcaaD2,
    #[serde(rename = "NCAA D3")]
    NcaaD3,
}

impl EducationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Youth => "Youth",
            EducationLevel::HighSchool => "High School",
            EducationLevel::Naia => "NAIA",
            EducationLevel::NcaaD1 => "NCAA D1",
            EducationLevel::NcaaD2 => "NCAA D2",
            EducationLevel::NcaaD3 => "NCAA D3",
        }
    }
}

impl FromStr for EducationLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Youth" => Ok(EducationLevel::Youth),
            "High School" => Ok(EducationLevel::HighSchool),
            "NAIA" => Ok(EducationLevel::Naia),
            "NCAA D1" => Ok(EducationLevel::NcaaD1),
            "NCAA D2" => Ok(EducationLevel::NcaaD2),
            "NCAA D3" => Ok(EducationLevel::NcaaD3),
            _ => Err(AppError::Validation(format!(
                "Unknown education level: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrillResult {
    pub id: String,
    pub user_id: String,
    pub drill_type: DrillType,
    pub result: ResultType,
    pub session_id: Option<String>,
    pub session_start_time: Option<DateTime<Utc>>,
    pub session_end_time: Option<DateTime<Utc>>,
    pub session_notes: Option<String>,
    pub evaluator_id: Option<String>,
    pub evaluator_username: Option<String>,
    pub is_evaluator_recorded: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbDrillResult {
    pub id: String,
    pub user_id: String,
    pub drill_type: String,
    pub result: String,
    pub session_id: Option<String>,
    pub session_start_time: Option<DateTime<Utc>>,
    pub session_end_time: Option<DateTime<Utc>>,
    pub session_notes: Option<String>,
    pub evaluator_id: Option<String>,
    pub evaluator_username: Option<String>,
    pub is_evaluator_recorded: bool,
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<DbDrillResult> for DrillResult {
    type Error = AppError;

    fn try_from(db: DbDrillResult) -> Result<Self, Self::Error> {
        Ok(Self {
            drill_type: db.drill_type.parse()?,
            result: db.result.parse()?,
            id: db.id,
            user_id: db.user_id,
            session_id: db.session_id,
            session_start_time: db.session_start_time,
            session_end_time: db.session_end_time,
            session_notes: db.session_notes,
            evaluator_id: db.evaluator_id,
            evaluator_username: db.evaluator_username,
            is_evaluator_recorded: db.is_evaluator_recorded,
            timestamp: db.timestamp,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrillSession {
    pub id: String,
    pub user_id: String,
    pub drill_type: DrillType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub results: Vec<ResultType>,
    pub notes: Option<String>,
    pub evaluator_id: Option<String>,
    pub evaluator_username: Option<String>,
    pub is_evaluator_recorded: bool,
    pub is_active: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbDrillSession {
    pub id: String,
    pub user_id: String,
    pub drill_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub results: String, // JSON array of result strings
    pub notes: Option<String>,
    pub evaluator_id: Option<String>,
    pub evaluator_username: Option<String>,
    pub is_evaluator_recorded: bool,
    pub is_active: bool,
}

impl TryFrom<DbDrillSession> for DrillSession {
    type Error = AppError;

    fn try_from(db: DbDrillSession) -> Result<Self, Self::Error> {
        let results: Vec<ResultType> = serde_json::from_str(&db.results).map_err(|e| {
            AppError::Internal(format!("Corrupt results for session {}: {}", db.id, e))
        })?;

        Ok(Self {
            drill_type: db.drill_type.parse()?,
            id: db.id,
            user_id: db.user_id,
            start_time: db.start_time,
            end_time: db.end_time,
            results,
            notes: db.notes,
            evaluator_id: db.evaluator_id,
            evaluator_username: db.evaluator_username,
            is_evaluator_recorded: db.is_evaluator_recorded,
            is_active: db.is_active,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub video_url: Option<String>,
    pub video_file: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub likes: Vec<String>,
    pub comments: Vec<serde_json::Value>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbNote {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub video_url: Option<String>,
    pub video_file: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub likes: String,
    pub comments: String,
}

impl From<DbNote> for Note {
    fn from(db: DbNote) -> Self {
        // Unreadable reaction columns degrade to empty lists rather than hiding the note
        Self {
            likes: serde_json::from_str(&db.likes).unwrap_or_default(),
            comments: serde_json::from_str(&db.comments).unwrap_or_default(),
            id: db.id,
            user_id: db.user_id,
            username: db.username,
            content: db.content,
            video_url: db.video_url,
            video_file: db.video_file,
            timestamp: db.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct GameFilmEvaluation {
    pub id: String,
    pub evaluator_id: String,
    pub evaluator_username: String,
    pub target_user_id: String,
    pub target_username: String,
    pub play_type: String,
    pub notes: String,
    pub video_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
