use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::{Validate, ValidationError};

use crate::auth::{Permission, User};
use crate::error::AppError;

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("username pattern is valid"));

pub type ValidationResult<T> = Result<T, Custom<Json<ValidationResponse>>>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationResponse {
    pub status: String,
    pub errors: HashMap<String, Vec<String>>,
}

impl ValidationResponse {
    pub fn new(errors: HashMap<String, Vec<String>>) -> Self {
        Self {
            status: "error".to_string(),
            errors,
        }
    }

    pub fn with_error(field: &str, message: &str) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self::new(errors)
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_PATTERN.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username").with_message(
            "Username must be 3-32 letters, digits, '.', '_' or '-'".into(),
        ))
    }
}

pub trait ToValidationResponse {
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>>;
}

impl ToValidationResponse for AppError {
    #[instrument]
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>> {
        self.log_and_record("API Validation Error");
        let status = self.status_code();

        let field = match &self {
            AppError::Database(_) => "database",
            AppError::Authentication(_) => "authentication",
            AppError::Authorization(_) => "authorization",
            AppError::NotFound(_) => "resource",
            AppError::Validation(_) => "request",
            AppError::Conflict(_) => "resource",
            AppError::Storage(_) => "storage",
            AppError::Internal(_) => "server",
        };

        Custom(
            status,
            Json(ValidationResponse::with_error(field, &self.public_message())),
        )
    }
}

impl ToValidationResponse for Status {
    #[instrument]
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>> {
        let (field, message) = match self {
            s if s == Status::Forbidden => (
                "permission",
                "You don't have permission to perform this action",
            ),
            s if s == Status::Unauthorized => ("authentication", "Authentication required"),
            s if s == Status::NotFound => ("resource", "Resource not found"),
            s if s == Status::Conflict => ("resource", "Resource already exists"),
            s if s == Status::BadRequest => ("request", "Bad request"),
            s if s == Status::UnprocessableEntity => ("validation", "Validation failed"),
            s if s == Status::InternalServerError => ("server", "Internal server error"),
            _ => ("error", "An error occurred"),
        };

        Custom(self, Json(ValidationResponse::with_error(field, message)))
    }
}

impl ToValidationResponse for validator::ValidationErrors {
    #[instrument]
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>> {
        let mut error_map = HashMap::new();

        for (field, field_errors) in self.field_errors() {
            let error_messages: Vec<String> = field_errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .clone()
                        .unwrap_or_else(|| "Invalid value".into())
                        .to_string()
                })
                .collect();

            error_map.insert(field.to_string(), error_messages);
        }

        Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::new(error_map)),
        )
    }
}

/// Runs `validator` rules on a request body, unwrapping it on success.
pub trait JsonValidateExt<T> {
    fn validate_custom(self) -> ValidationResult<T>;
}

impl<T: Validate> JsonValidateExt<T> for Json<T> {
    fn validate_custom(self) -> ValidationResult<T> {
        let inner = self.into_inner();
        match inner.validate() {
            Ok(()) => Ok(inner),
            Err(errors) => Err(errors.to_validation_response()),
        }
    }
}

pub trait AppErrorExt<T> {
    fn validate_custom(self) -> ValidationResult<T>;
}

impl<T> AppErrorExt<T> for Result<T, AppError> {
    fn validate_custom(self) -> ValidationResult<T> {
        self.map_err(ToValidationResponse::to_validation_response)
    }
}

pub trait PermissionCheckExt {
    fn check_permission(&self, permission: Permission) -> ValidationResult<()>;
    fn check_self_or(&self, owner_id: &str, permission: Permission) -> ValidationResult<()>;
}

impl PermissionCheckExt for User {
    fn check_permission(&self, permission: Permission) -> ValidationResult<()> {
        self.require_permission(permission).validate_custom()
    }

    fn check_self_or(&self, owner_id: &str, permission: Permission) -> ValidationResult<()> {
        self.require_self_or(owner_id, permission).validate_custom()
    }
}
