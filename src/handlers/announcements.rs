use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use super::MessageResponse;
use crate::auth::middleware::{AdminAuth, AuthenticatedUser};
use crate::error::AppError;
use crate::AppState;
use entity::announcement;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAnnouncementRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub is_published: Option<bool>,
}

/// Published announcements, newest first. Admins can pass `?all=true` to
/// include drafts.
pub async fn list(
    auth: Option<AuthenticatedUser>,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<announcement::Model>>, AppError> {
    let include_drafts = query.all && auth.is_some_and(|a| a.is_admin());

    let mut find = announcement::Entity::find();
    if !include_drafts {
        find = find.filter(announcement::Column::IsPublished.eq(true));
    }
    let announcements = find
        .order_by_desc(announcement::Column::CreatedAt)
        .all(&state.db)
        .await?;
    Ok(Json(announcements))
}

pub async fn create(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<announcement::Model>), AppError> {
    let title = req.title.trim();
    if title.is_empty() || req.body.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Title and body are required".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let announcement = announcement::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(title.to_string()),
        body: Set(req.body),
        image_url: Set(req.image_url.filter(|u| !u.trim().is_empty())),
        is_published: Set(req.is_published.unwrap_or(false)),
        created_by: Set(admin.user_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(announcement)))
}

pub async fn update(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAnnouncementRequest>,
) -> Result<Json<announcement::Model>, AppError> {
    let existing = announcement::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::AnnouncementNotFound)?;

    let mut active: announcement::ActiveModel = existing.into();
    if let Some(title) = req.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title cannot be empty".to_string()));
        }
        active.title = Set(title);
    }
    if let Some(body) = req.body {
        active.body = Set(body);
    }
    if let Some(image_url) = req.image_url {
        // Empty string clears the image
        active.image_url = Set(Some(image_url).filter(|u| !u.trim().is_empty()));
    }
    if let Some(is_published) = req.is_published {
        active.is_published = Set(is_published);
    }
    active.updated_at = Set(Utc::now().naive_utc());

    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let result = announcement::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::AnnouncementNotFound);
    }
    Ok(Json(MessageResponse::new("Announcement deleted")))
}
