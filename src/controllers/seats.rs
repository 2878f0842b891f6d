use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::core::ledger::{NewOccupant, PlanRef, SeatUpdate};
use crate::error::CoreError;
use crate::middleware::AdminUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/seat", post(add_seat))
        .route(
            "/seat/{seat_number}",
            get(get_seat).put(update_seat).delete(delete_seat),
        )
        .route("/seat/{seat_number}/release", patch(release_seat))
        .route("/seat/{seat_number}/students", post(add_student_to_seat))
        .route("/seats", get(all_seats))
        .route("/seats/available", get(available_seats))
        .route("/seats/initialize", post(initialize_seats))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub seat_number: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub national_id: String,
    pub subscription_plan: PlanRef,
    pub slot: Option<String>,
    pub id_number: Option<String>,
    pub father_name: Option<String>,
    pub address: Option<String>,
    pub age: Option<i32>,
    pub fee_paid: Option<bool>,
    pub joining_date: Option<DateTime<Utc>>,
}

// POST /api/admin/register
async fn register(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, CoreError> {
    req.validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let record = state
        .ledger
        .allocate(
            &req.seat_number,
            NewOccupant {
                name: req.name,
                national_id: req.national_id,
                plan: req.subscription_plan,
                slot: req.slot,
                secondary_id: req.id_number,
                father_name: req.father_name,
                address: req.address,
                age: req.age,
                fee_paid: req.fee_paid.unwrap_or(false),
                join_date: req.joining_date,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Subscriber registered successfully",
            "seatNumber": record.seat_number,
        })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSeatRequest {
    pub seat_number: String,
}

// POST /api/admin/seat
async fn add_seat(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<AddSeatRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let record = state.ledger.register_placeholder(&req.seat_number).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Seat added successfully",
            "seatNumber": record.seat_number,
        })),
    ))
}

// GET /api/admin/seat/{seat_number}
async fn get_seat(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(seat_number): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let view = state.ledger.get_by_seat(&seat_number).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSeatRequest {
    pub student_name: Option<String>,
    pub plan_name: Option<PlanRef>,
    pub national_id: Option<String>,
    pub slot: Option<String>,
    pub is_active: Option<bool>,
    pub fee_paid: Option<bool>,
    pub joining_date: Option<DateTime<Utc>>,
}

// PUT /api/admin/seat/{seat_number}
//
// The request either rebinds the seat to a (possibly new) subscriber, or
// flips a single flag. A body naming a subscriber must carry name, plan and
// national id together.
async fn update_seat(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(seat_number): Path<String>,
    Json(req): Json<UpdateSeatRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let update = match (req.student_name, req.plan_name, req.national_id) {
        (Some(name), Some(plan), Some(national_id)) => {
            SeatUpdate::ReassignOccupant(NewOccupant {
                name,
                national_id,
                plan,
                slot: req.slot,
                secondary_id: None,
                father_name: None,
                address: None,
                age: None,
                fee_paid: req.fee_paid.unwrap_or(false),
                join_date: req.joining_date,
            })
        }
        (None, None, None) => match (req.is_active, req.fee_paid) {
            (Some(active), _) => SeatUpdate::ToggleActive(active),
            (None, Some(paid)) => SeatUpdate::SetFeePaid(paid),
            (None, None) => {
                return Err(CoreError::Validation(
                    "Nothing to update: provide a subscriber or a flag".to_string(),
                ))
            }
        },
        _ => {
            return Err(CoreError::Validation(
                "Student name, plan name and national id are required together".to_string(),
            ))
        }
    };

    let record = state.ledger.update(&seat_number, update).await?;
    Ok(Json(json!({
        "message": "Seat updated successfully",
        "seatNumber": record.seat_number,
        "isActive": record.is_active,
        "feePaid": record.fee_paid,
    })))
}

// DELETE /api/admin/seat/{seat_number}
async fn delete_seat(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(seat_number): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let deleted = state.ledger.remove(&seat_number).await?;
    Ok(Json(json!({
        "message": "Seat deleted successfully",
        "seatNumber": seat_number,
        "deletedCount": deleted,
    })))
}

// PATCH /api/admin/seat/{seat_number}/release
async fn release_seat(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(seat_number): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let record = state.ledger.release(&seat_number).await?;
    Ok(Json(json!({
        "message": "Seat released successfully",
        "seatNumber": record.seat_number,
    })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddStudentRequest {
    #[validate(length(min = 1))]
    pub student_name: String,
    pub plan_name: PlanRef,
    #[validate(length(min = 1))]
    pub national_id: String,
    pub slot: Option<String>,
    pub fee_paid: Option<bool>,
}

// POST /api/admin/seat/{seat_number}/students
async fn add_student_to_seat(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(seat_number): Path<String>,
    Json(req): Json<AddStudentRequest>,
) -> Result<impl IntoResponse, CoreError> {
    req.validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let record = state
        .ledger
        .add_to_shared_seat(
            &seat_number,
            NewOccupant {
                name: req.student_name,
                national_id: req.national_id,
                plan: req.plan_name,
                slot: req.slot,
                secondary_id: None,
                father_name: None,
                address: None,
                age: None,
                fee_paid: req.fee_paid.unwrap_or(false),
                join_date: None,
            },
        )
        .await?;

    let all = state.ledger.get_by_seat(&seat_number).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Student added to seat successfully",
            "seatNumber": record.seat_number,
            "totalStudentsInSeat": all.occupants.len(),
        })),
    ))
}

// GET /api/admin/seats
async fn all_seats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, CoreError> {
    let snapshot = state.dashboard.snapshot().await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    pub section: Option<String>,
}

// GET /api/admin/seats/available?section=A
async fn available_seats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<AvailableQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let section = match params.section.as_deref() {
        Some(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c.to_ascii_uppercase()),
                _ => {
                    return Err(CoreError::Validation(
                        "Section must be a single letter".to_string(),
                    ))
                }
            }
        }
        None => None,
    };
    let available = state.registry.available_seats(section).await?;
    Ok(Json(json!({
        "count": available.len(),
        "availableSeats": available,
    })))
}

// POST /api/admin/seats/initialize
async fn initialize_seats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, CoreError> {
    let created = state.registry.ensure_all_default_seats().await?;
    Ok(Json(json!({
        "message": "Default seats ensured",
        "created": created,
    })))
}
