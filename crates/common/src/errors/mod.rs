//! Error types for VOC Atlas services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidReference,

    // Resource errors (4xxx)
    NotFound,
    SubclassNotFound,
    VocNotFound,
    NoMatches,

    // Conflict errors (5xxx)
    Conflict,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Hierarchy integrity errors (8xxx)
    DanglingReference,
    CyclicHierarchy,
    HierarchyTooDeep,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidReference => 1002,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::SubclassNotFound => 4002,
            ErrorCode::VocNotFound => 4003,
            ErrorCode::NoMatches => 4004,

            // Conflicts (5xxx)
            ErrorCode::Conflict => 5001,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            // Hierarchy (8xxx)
            ErrorCode::DanglingReference => 8001,
            ErrorCode::CyclicHierarchy => 8002,
            ErrorCode::HierarchyTooDeep => 8003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>
    },

    #[error("Invalid reference: {message}")]
    InvalidReference { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("VOC subclass not found: {name}")]
    SubclassNotFound { name: String },

    #[error("No VOC found for id {id}")]
    VocNotFound { id: i32 },

    #[error("{message}")]
    NoMatches { message: String },

    // Conflict errors
    #[error("Duplicate resource: {message}")]
    Duplicate { message: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Hierarchy integrity errors
    #[error("{entity} {id} references unknown VOC subclass {missing}")]
    DanglingReference { entity: String, id: i32, missing: i32 },

    #[error("Cycle in VOC subclass hierarchy: subclass {id} is its own ancestor")]
    CyclicHierarchy { id: i32 },

    #[error("VOC subclass hierarchy deeper than {max_depth} levels above subclass {id}")]
    HierarchyTooDeep { id: i32, max_depth: usize },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidReference { .. } => ErrorCode::InvalidReference,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::SubclassNotFound { .. } => ErrorCode::SubclassNotFound,
            AppError::VocNotFound { .. } => ErrorCode::VocNotFound,
            AppError::NoMatches { .. } => ErrorCode::NoMatches,
            AppError::Duplicate { .. } => ErrorCode::Conflict,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::DanglingReference { .. } => ErrorCode::DanglingReference,
            AppError::CyclicHierarchy { .. } => ErrorCode::CyclicHierarchy,
            AppError::HierarchyTooDeep { .. } => ErrorCode::HierarchyTooDeep,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::InvalidReference { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } |
            AppError::SubclassNotFound { .. } |
            AppError::VocNotFound { .. } |
            AppError::NoMatches { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Duplicate { .. } => StatusCode::CONFLICT,

            // 500 Internal Server Error
            AppError::Database(_) |
            AppError::DatabaseConnection { .. } |
            AppError::DanglingReference { .. } |
            AppError::CyclicHierarchy { .. } |
            AppError::HierarchyTooDeep { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for a missing row looked up by primary key
    pub fn not_found(resource_type: &str, id: impl ToString) -> Self {
        AppError::NotFound {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Map a database error raised by an insert.
    ///
    /// Foreign key violations become `InvalidReference` and unique violations
    /// become `Duplicate`; everything else stays a database error.
    pub fn from_insert(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
                AppError::InvalidReference { message }
            }
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                AppError::Duplicate { message }
            }
            _ => AppError::Database(err),
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let field = match self {
            AppError::Validation { field, .. } => field,
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field = err.field_errors().keys().next().map(|f| f.to_string());
        AppError::Validation {
            message: err.to_string(),
            field,
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseConnection {
            message: format!("Migration failed: {}", err),
        }
    }
}
