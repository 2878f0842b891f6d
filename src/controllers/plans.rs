use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::CoreError;
use crate::middleware::AdminUser;
use crate::store::{NewPlan, PlanPatch};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/subscription", post(create_plan).put(update_plan))
        .route("/subscription/{plan_id}", delete(delete_plan))
        .route("/subscriptions", get(list_plans))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[validate(length(min = 1))]
    pub plan_name: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    /// Free text such as "1 month" or "2 weeks".
    #[validate(length(min = 1))]
    pub duration: String,
    pub subscribers: Option<i32>,
    pub status: Option<bool>,
}

// POST /api/admin/subscription
async fn create_plan(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, CoreError> {
    req.validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    if state
        .store
        .find_plan_by_name(&req.plan_name)
        .await
        .map_err(CoreError::from)?
        .is_some()
    {
        return Err(CoreError::Conflict(format!(
            "Plan {} already exists",
            req.plan_name
        )));
    }

    let plan = state
        .store
        .insert_plan(NewPlan {
            plan_name: req.plan_name,
            price: req.price,
            duration: req.duration,
            subscribers: req.subscribers.unwrap_or(0),
            is_active: req.status.unwrap_or(true),
        })
        .await
        .map_err(CoreError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "New subscription plan added",
            "planName": plan.plan_name,
        })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    pub plan_name: String,
    pub price: Option<f64>,
    pub duration: Option<String>,
    pub subscribers: Option<i32>,
    pub status: Option<bool>,
}

// PUT /api/admin/subscription
async fn update_plan(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<UpdatePlanRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let updated = state
        .store
        .update_plan_by_name(
            &req.plan_name,
            PlanPatch {
                price: req.price,
                duration: req.duration,
                subscribers: req.subscribers,
                is_active: req.status,
            },
        )
        .await
        .map_err(CoreError::from)?
        .ok_or_else(|| CoreError::NotFound("Subscription plan not found".to_string()))?;

    Ok(Json(json!({
        "message": "Subscription plan updated successfully",
        "planName": updated.plan_name,
    })))
}

// DELETE /api/admin/subscription/{plan_id}
async fn delete_plan(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(plan_id): Path<i64>,
) -> Result<impl IntoResponse, CoreError> {
    let deleted = state
        .store
        .delete_plan(plan_id)
        .await
        .map_err(CoreError::from)?;
    if deleted == 0 {
        return Err(CoreError::NotFound("Subscription plan not found".to_string()));
    }
    Ok(Json(json!({ "message": "Subscription plan deleted" })))
}

// GET /api/admin/subscriptions
async fn list_plans(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, CoreError> {
    let plans = state.store.list_plans().await.map_err(CoreError::from)?;
    Ok(Json(plans))
}
