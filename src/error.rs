use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the store collaborator. Unique-constraint violations
/// are reported distinctly so a lost check-then-write race turns into a
/// detectable conflict instead of silent corruption.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0}")]
    UniqueViolation(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = e {
            if db.code().as_deref() == Some("23505") {
                let field = match db.constraint() {
                    Some(c) if c.contains("national_id") => "national_id",
                    Some(c) if c.contains("seat_number") => "seat_number",
                    Some(c) if c.contains("plan_name") => "plan_name",
                    Some(c) if c.contains("email") => "email",
                    _ => "unknown",
                };
                return StoreError::UniqueViolation(field.to_string());
            }
        }
        StoreError::Unavailable(e.to_string())
    }
}

/// Error taxonomy of the core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

impl CoreError {
    pub fn invalid_seat(id: &str) -> Self {
        CoreError::Validation(format!("Invalid seat number format: {id}"))
    }
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(field) => {
                CoreError::Conflict(format!("Duplicate value for unique field {field}"))
            }
            other => CoreError::StoreUnavailable(other),
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            CoreError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            CoreError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            CoreError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            CoreError::StoreUnavailable(e) => {
                tracing::error!("store failure: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
