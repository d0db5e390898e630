use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use serde::Deserialize;

use crate::auth::middleware::{AdminAuth, AuthenticatedUser};
use crate::booking::{self, id_cards};
use crate::error::AppError;
use crate::AppState;
use entity::sea_orm_active_enums::IdCardStatus;
use entity::{id_card, id_card_event};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<IdCardStatus>,
}

#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    pub appointment_id: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReturnRequest {
    pub remarks: Option<String>,
}

pub async fn list(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<id_card::Model>>, AppError> {
    let mut find = id_card::Entity::find();
    if let Some(status) = query.status {
        find = find.filter(id_card::Column::Status.eq(status));
    }
    let cards = find
        .order_by_desc(id_card::Column::UpdatedAt)
        .all(&state.db)
        .await?;
    Ok(Json(cards))
}

pub async fn mine(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<id_card::Model>>, AppError> {
    let cards = id_card::Entity::find()
        .filter(id_card::Column::UserId.eq(&auth.user_id))
        .order_by_desc(id_card::Column::UpdatedAt)
        .all(&state.db)
        .await?;
    Ok(Json(cards))
}

/// Hand out the card for an approved appointment.
pub async fn issue(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<IssueRequest>,
) -> Result<(StatusCode, Json<id_card::Model>), AppError> {
    let card = booking::issue_id_card(&state, &admin, &req.appointment_id, req.remarks).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn mark_returned(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ReturnRequest>>,
) -> Result<Json<id_card::Model>, AppError> {
    let Json(req) = body.unwrap_or_default();
    let txn = state.db.begin().await?;
    let card = id_cards::mark_returned(&txn, &id, &admin.user_id, req.remarks).await?;
    txn.commit().await?;

    tracing::info!(card_id = %card.id, "ID card returned");
    Ok(Json(card))
}

/// Owner or admin.
pub async fn history(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<id_card_event::Model>>, AppError> {
    let card = id_card::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::IdCardNotFound)?;
    auth.ensure_can_access(&card.user_id)?;
    Ok(Json(id_cards::history(&state.db, &card.id).await?))
}
