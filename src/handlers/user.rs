use axum::{
    extract::{Path, Query, State},
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};

use super::{MessageResponse, UserResponse};
use crate::auth::middleware::{AdminAuth, AuthenticatedUser};
use crate::booking;
use crate::db::queries;
use crate::error::AppError;
use crate::AppState;

// --- Request / Response types ---

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

// --- Handlers ---

/// Self or admin.
pub async fn get_user(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    auth.ensure_can_access(&user_id)?;
    let user = queries::users::find_by_id(&state.db, &user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(user.into()))
}

pub async fn update_profile(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = queries::users::find_by_id(&state.db, &auth.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let Some(name) = req.name.map(|n| n.trim().to_string()) else {
        return Ok(Json(user.into()));
    };
    if name.is_empty() {
        return Err(AppError::BadRequest("Name cannot be empty".to_string()));
    }

    let mut active: entity::user::ActiveModel = user.into();
    active.name = Set(name);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    let user = active.update(&state.db).await?;
    Ok(Json(user.into()))
}

pub async fn list_users(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut find = entity::user::Entity::find();
    if let Some(search) = query.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            find = find.filter(
                Condition::any()
                    .add(entity::user::Column::Email.contains(search))
                    .add(entity::user::Column::Name.contains(search))
                    .add(entity::user::Column::StudentId.contains(search)),
            );
        }
    }

    let paginator = find
        .order_by_desc(entity::user::Column::CreatedAt)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let users = paginator.fetch_page(page - 1).await?;

    Ok(Json(UserListResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
        total,
        page,
        per_page,
    }))
}

/// Removes the user and their appointments, freeing any seats they held.
pub async fn delete_user(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if admin.user_id == user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }
    booking::delete_user(&state, &user_id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}
