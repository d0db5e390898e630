use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use super::MessageResponse;
use crate::auth::middleware::AdminAuth;
use crate::booking::window;
use crate::error::AppError;
use crate::AppState;
use entity::scheduling_window;
use entity::sea_orm_active_enums::WindowPurpose;

#[derive(Debug, Deserialize)]
pub struct CreateWindowRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub purpose: Option<WindowPurpose>,
    pub is_active: Option<bool>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWindowRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub purpose: Option<WindowPurpose>,
    pub is_active: Option<bool>,
    pub remarks: Option<String>,
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
    if start > end {
        return Err(AppError::BadRequest(
            "start_date must not be after end_date".to_string(),
        ));
    }
    Ok(())
}

pub async fn list(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<scheduling_window::Model>>, AppError> {
    let windows = scheduling_window::Entity::find()
        .order_by_desc(scheduling_window::Column::StartDate)
        .all(&state.db)
        .await?;
    Ok(Json(windows))
}

/// Windows open today. Public so the booking page can explain why nothing is offered.
pub async fn active(
    State(state): State<AppState>,
) -> Result<Json<Vec<scheduling_window::Model>>, AppError> {
    Ok(Json(window::open_windows(&state.db, state.today()).await?))
}

pub async fn create(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateWindowRequest>,
) -> Result<(StatusCode, Json<scheduling_window::Model>), AppError> {
    check_range(req.start_date, req.end_date)?;

    let now = Utc::now().naive_utc();
    let window = scheduling_window::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        start_date: Set(req.start_date),
        end_date: Set(req.end_date),
        purpose: Set(req.purpose.unwrap_or(WindowPurpose::All)),
        is_active: Set(req.is_active.unwrap_or(true)),
        remarks: Set(req.remarks),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        window_id = %window.id,
        start = %window.start_date,
        end = %window.end_date,
        "scheduling window created"
    );
    Ok((StatusCode::CREATED, Json(window)))
}

pub async fn update(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateWindowRequest>,
) -> Result<Json<scheduling_window::Model>, AppError> {
    let window = scheduling_window::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::WindowNotFound)?;

    check_range(
        req.start_date.unwrap_or(window.start_date),
        req.end_date.unwrap_or(window.end_date),
    )?;

    let mut active: scheduling_window::ActiveModel = window.into();
    if let Some(start_date) = req.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = req.end_date {
        active.end_date = Set(end_date);
    }
    if let Some(purpose) = req.purpose {
        active.purpose = Set(purpose);
    }
    if let Some(is_active) = req.is_active {
        active.is_active = Set(is_active);
    }
    if req.remarks.is_some() {
        active.remarks = Set(req.remarks);
    }
    active.updated_at = Set(Utc::now().naive_utc());

    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let result = scheduling_window::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::WindowNotFound);
    }
    Ok(Json(MessageResponse::new("Scheduling window deleted")))
}
