use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use super::MessageResponse;
use crate::auth::middleware::{AdminAuth, AuthenticatedUser};
use crate::booking::{
    self, status, NewAppointment, QrCodeResponse, ScanOutcome, ScanRequest, StatusChange,
};
use crate::db::queries;
use crate::error::AppError;
use crate::AppState;
use entity::appointment;

#[derive(Debug, Deserialize)]
pub struct ListAppointmentsQuery {
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
}

pub async fn create(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Json(req): Json<NewAppointment>,
) -> Result<(StatusCode, Json<appointment::Model>), AppError> {
    let appt = booking::create_appointment(&state, &auth, req).await?;
    Ok((StatusCode::CREATED, Json(appt)))
}

pub async fn mine(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<appointment::Model>>, AppError> {
    let appointments = appointment::Entity::find()
        .filter(appointment::Column::UserId.eq(&auth.user_id))
        .order_by_desc(appointment::Column::AppointmentDate)
        .order_by_desc(appointment::Column::StartTime)
        .all(&state.db)
        .await?;
    Ok(Json(appointments))
}

pub async fn list(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<Vec<appointment::Model>>, AppError> {
    let mut find = appointment::Entity::find();
    if let Some(date) = query.date {
        find = find.filter(appointment::Column::AppointmentDate.eq(date));
    }
    if let Some(raw) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status = status::parse_status(raw)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {raw}")))?;
        find = find.filter(appointment::Column::Status.eq(status));
    }
    let appointments = find
        .order_by_asc(appointment::Column::AppointmentDate)
        .order_by_asc(appointment::Column::StartTime)
        .all(&state.db)
        .await?;
    Ok(Json(appointments))
}

pub async fn get(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<appointment::Model>, AppError> {
    let appt = queries::appointments::find_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::AppointmentNotFound)?;
    auth.ensure_can_access(&appt.user_id)?;
    Ok(Json(appt))
}

/// Owner or admin; owners may only cancel.
pub async fn update_status(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<appointment::Model>, AppError> {
    let appt = booking::update_status(&state, &auth, &id, change).await?;
    Ok(Json(appt))
}

/// Admin edit: status and/or remarks.
pub async fn admin_update(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<appointment::Model>, AppError> {
    let appt = booking::update_status(&state, &admin, &id, change).await?;
    Ok(Json(appt))
}

pub async fn delete(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    booking::cancel_appointment(&state, &auth, &id).await?;
    Ok(Json(MessageResponse::new("Appointment cancelled")))
}

pub async fn generate_qr(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QrCodeResponse>, AppError> {
    Ok(Json(booking::generate_qr(&state, &auth, &id).await?))
}

pub async fn scan(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanOutcome>, AppError> {
    Ok(Json(booking::scan(&state, &admin, req).await?))
}
