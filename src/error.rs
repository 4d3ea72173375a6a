use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, Error};
use serde_json::json;

/// Error taxonomy shared by the stores, the services and the HTTP layer.
///
/// Every variant carries a caller-facing message except `Internal`, whose
/// message is logged and replaced by a generic one in the response body.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum AppError {
    #[display(fmt = "{}", message)]
    NotFound { message: String },

    #[display(fmt = "{}", message)]
    Conflict { message: String },

    #[display(fmt = "{}", message)]
    InvalidArgument { message: String },

    #[display(fmt = "{}", message)]
    Unauthorized { message: String },

    #[display(fmt = "{}", message)]
    Forbidden { message: String },

    #[display(fmt = "internal error: {}", message)]
    Internal { message: String },
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal { message } => {
                tracing::error!(error = %message, "Request failed with internal error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

/// sqlx::Error::Database (unique key)   → Conflict
/// sqlx::Error::Database (foreign key)  → NotFound
/// sqlx::Error::RowNotFound             → NotFound
/// everything else                      → Internal
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::conflict("Record already exists")
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::not_found("Referenced record does not exist")
            }
            _ => AppError::internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::internal(format!("migration failed: {err}"))
    }
}

pub type AppResult<T> = Result<T, AppError>;
