use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::CoreError;
use crate::middleware::{issue_token, AdminUser};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/dashboard", get(dashboard))
        .route("/subscription-ending", get(subscription_ending))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// POST /api/admin/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, CoreError> {
    req.validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let admin = state
        .store
        .find_admin_by_email(&req.email)
        .await
        .map_err(CoreError::from)?
        .ok_or_else(|| CoreError::NotFound("Admin not found".to_string()))?;

    if !bcrypt::verify(&req.password, &admin.password_hash).unwrap_or(false) {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response());
    }

    let token = issue_token(admin.id, &state.config.jwt)
        .map_err(|e| CoreError::Validation(format!("Could not issue token: {e}")))?;
    Ok(Json(json!({ "token": token })).into_response())
}

// GET /api/admin/dashboard
async fn dashboard(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, CoreError> {
    let overview = state.dashboard.expiry_overview().await?;
    Ok(Json(overview))
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub window: Option<u32>,
}

// GET /api/admin/subscription-ending?window=5
async fn subscription_ending(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<ForecastQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let entries = state.dashboard.expiry_forecast(params.window).await?;
    Ok(Json(json!({
        "count": entries.len(),
        "users": entries,
    })))
}
