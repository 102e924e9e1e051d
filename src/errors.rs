//! # Error Handling
//!
//! Every engine operation fails with an [`ApiError`]:
//!
//! - [`ApiError::NotFound`]: the targeted row, or a row the operation requires,
//!   does not exist. Nothing was changed.
//! - [`ApiError::Conflict`]: an update lost an optimistic-concurrency race and the
//!   row still exists. Retry with a fresh read.
//! - [`ApiError::BadRequest`]: the input was rejected before reaching the store.
//! - [`ApiError::Database`]: any other store fault, carried unmodified.
//!
//! Store faults are logged through `tracing` when the error is turned into a
//! response and never exposed to callers.
//!
//! ```rust,ignore
//! use relation::{ApiError, CRUDResource, services::Order};
//!
//! async fn handler(db: DatabaseConnection, id: String) -> Result<Json<Order>, ApiError> {
//!     Ok(Json(Order::get_one(&db, &id).await?))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found
    NotFound {
        /// Resource type (e.g., "Order")
        resource: String,
        /// Optional id that wasn't found
        id: Option<String>,
    },

    /// 400 Bad Request
    BadRequest { message: String },

    /// 409 Conflict - concurrent modification of a row that still exists
    Conflict { message: String },

    /// 500 Internal Server Error - store fault (details logged, not exposed)
    Database {
        message: String,
        internal: DbErr,
    },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Wrap a store fault. The `DbErr` is kept for logging but never shown to users.
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The sanitized message sent to callers
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => {
                if let Some(id) = id {
                    format!("{resource} with ID '{id}' not found")
                } else {
                    format!("{resource} not found")
                }
            }
            Self::BadRequest { message }
            | Self::Conflict { message }
            | Self::Database { message, .. } => message.clone(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database { internal, .. } => Some(internal),
            _ => None,
        }
    }
}

/// `DbErr::RecordNotFound` becomes 404, every other store fault becomes 500.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::NotFound {
                    resource: resource.to_string(),
                    id: None,
                }
            }
            _ => Self::database(err),
        }
    }
}
