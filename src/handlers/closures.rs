use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use super::MessageResponse;
use crate::auth::middleware::AdminAuth;
use crate::error::AppError;
use crate::AppState;
use entity::calendar_closure;

#[derive(Debug, Deserialize)]
pub struct ClosureQuery {
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClosureRequest {
    pub date: NaiveDate,
    pub remarks: Option<String>,
}

/// Closed days, by exact date or within `[start, end]`.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ClosureQuery>,
) -> Result<Json<Vec<calendar_closure::Model>>, AppError> {
    let mut find = calendar_closure::Entity::find();
    if let Some(date) = query.date {
        find = find.filter(calendar_closure::Column::Date.eq(date));
    } else {
        if let Some(start) = query.start {
            find = find.filter(calendar_closure::Column::Date.gte(start));
        }
        if let Some(end) = query.end {
            find = find.filter(calendar_closure::Column::Date.lte(end));
        }
    }
    let closures = find
        .order_by_asc(calendar_closure::Column::Date)
        .all(&state.db)
        .await?;
    Ok(Json(closures))
}

pub async fn create(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateClosureRequest>,
) -> Result<(StatusCode, Json<calendar_closure::Model>), AppError> {
    let existing = calendar_closure::Entity::find()
        .filter(calendar_closure::Column::Date.eq(req.date))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!("{} is already closed", req.date)));
    }

    let closure = calendar_closure::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        date: Set(req.date),
        remarks: Set(req.remarks.filter(|r| !r.trim().is_empty())),
        created_by: Set(admin.user_id),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(date = %closure.date, "calendar closure added");
    Ok((StatusCode::CREATED, Json(closure)))
}

pub async fn delete(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let result = calendar_closure::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::ClosureNotFound);
    }
    Ok(Json(MessageResponse::new("Calendar closure removed")))
}
