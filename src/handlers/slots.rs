use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MessageResponse;
use crate::auth::middleware::AdminAuth;
use crate::booking::parse_hhmm;
use crate::booking::window::{self, SlotQuery};
use crate::db::queries;
use crate::error::AppError;
use crate::AppState;
use entity::sea_orm_active_enums::Purpose;
use entity::{appointment, slot};

/// Standard hourly buckets, lunch hour excluded.
pub const DEFAULT_BUCKETS: [(&str, &str); 8] = [
    ("08:00", "09:00"),
    ("09:00", "10:00"),
    ("10:00", "11:00"),
    ("11:00", "12:00"),
    ("13:00", "14:00"),
    ("14:00", "15:00"),
    ("15:00", "16:00"),
    ("16:00", "17:00"),
];

const DEFAULT_CAPACITY: i32 = 20;

// --- Request / Response types ---

#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    pub date: Option<NaiveDate>,
    pub purpose: Option<Purpose>,
}

#[derive(Debug, Deserialize)]
pub struct ListSlotsQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub purpose: Purpose,
    pub capacity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateDefaultsRequest {
    pub date: NaiveDate,
    pub capacity: Option<i32>,
    pub purposes: Option<Vec<Purpose>>,
}

#[derive(Debug, Serialize)]
pub struct CreateDefaultsResponse {
    pub created: Vec<slot::Model>,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSlotRequest {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<i32>,
}

fn validate_times(start: &str, end: &str) -> Result<(String, String), AppError> {
    let (Some(start), Some(end)) = (parse_hhmm(start), parse_hhmm(end)) else {
        return Err(AppError::BadRequest("Times must be HH:MM".to_string()));
    };
    if start >= end {
        return Err(AppError::BadRequest(
            "start_time must be before end_time".to_string(),
        ));
    }
    Ok((start, end))
}

fn validate_capacity(capacity: i32) -> Result<i32, AppError> {
    if capacity < 0 {
        return Err(AppError::BadRequest("Capacity cannot be negative".to_string()));
    }
    Ok(capacity)
}

fn new_slot(
    date: NaiveDate,
    start: String,
    end: String,
    purpose: Purpose,
    capacity: i32,
) -> slot::ActiveModel {
    let now = Utc::now().naive_utc();
    slot::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        date: Set(date),
        start_time: Set(start),
        end_time: Set(end),
        purpose: Set(purpose),
        capacity: Set(capacity),
        booked_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

async fn slot_exists<C: sea_orm::ConnectionTrait>(
    db: &C,
    date: NaiveDate,
    start: &str,
    purpose: Purpose,
) -> Result<bool, AppError> {
    Ok(slot::Entity::find()
        .filter(slot::Column::Date.eq(date))
        .filter(slot::Column::StartTime.eq(start))
        .filter(slot::Column::Purpose.eq(purpose))
        .one(db)
        .await?
        .is_some())
}

// --- Handlers ---

/// Slots students can book now.
pub async fn available(
    State(state): State<AppState>,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<Vec<slot::Model>>, AppError> {
    let query = SlotQuery {
        date: query.date,
        purpose: query.purpose,
    };
    let slots = window::available_slots(
        &state.db,
        state.today(),
        &query,
        state.config.daily_appointment_cap,
    )
    .await?;
    Ok(Json(slots))
}

pub async fn list(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListSlotsQuery>,
) -> Result<Json<Vec<slot::Model>>, AppError> {
    let mut find = slot::Entity::find();
    if let Some(date) = query.date {
        find = find.filter(slot::Column::Date.eq(date));
    }
    let slots = find
        .order_by_asc(slot::Column::Date)
        .order_by_asc(slot::Column::StartTime)
        .all(&state.db)
        .await?;
    Ok(Json(slots))
}

pub async fn create(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<slot::Model>), AppError> {
    let (start, end) = validate_times(&req.start_time, &req.end_time)?;
    let capacity = validate_capacity(req.capacity)?;

    if slot_exists(&state.db, req.date, &start, req.purpose).await? {
        return Err(AppError::Conflict(format!(
            "A {} slot at {start} on {} already exists",
            req.purpose.as_str(),
            req.date
        )));
    }

    let slot = new_slot(req.date, start, end, req.purpose, capacity)
        .insert(&state.db)
        .await?;
    tracing::info!(slot_id = %slot.id, date = %slot.date, "slot created");
    Ok((StatusCode::CREATED, Json(slot)))
}

/// Create the standard buckets for a day, leaving existing ones alone.
pub async fn create_defaults(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateDefaultsRequest>,
) -> Result<(StatusCode, Json<CreateDefaultsResponse>), AppError> {
    let capacity = validate_capacity(req.capacity.unwrap_or(DEFAULT_CAPACITY))?;
    let purposes = req
        .purposes
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| vec![Purpose::NewId, Purpose::Renewal, Purpose::LostReplacement]);

    let txn = state.db.begin().await?;
    let mut created = Vec::new();
    let mut skipped = 0;
    for purpose in purposes {
        for (start, end) in DEFAULT_BUCKETS {
            if slot_exists(&txn, req.date, start, purpose).await? {
                skipped += 1;
                continue;
            }
            let slot = new_slot(req.date, start.to_string(), end.to_string(), purpose, capacity)
                .insert(&txn)
                .await?;
            created.push(slot);
        }
    }
    txn.commit().await?;

    tracing::info!(date = %req.date, created = created.len(), skipped, "default slots created");
    Ok((
        StatusCode::CREATED,
        Json(CreateDefaultsResponse { created, skipped }),
    ))
}

/// Times and capacity change together or not at all. Booked appointments
/// follow the new times.
pub async fn update(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSlotRequest>,
) -> Result<Json<slot::Model>, AppError> {
    let capacity = req.capacity.map(validate_capacity).transpose()?;

    let txn = state.db.begin().await?;
    let slot = queries::slots::find_by_id(&txn, &id)
        .await?
        .ok_or(AppError::SlotNotFound)?;

    let (start, end) = validate_times(
        req.start_time.as_deref().unwrap_or(&slot.start_time),
        req.end_time.as_deref().unwrap_or(&slot.end_time),
    )?;
    if start != slot.start_time && slot_exists(&txn, slot.date, &start, slot.purpose).await? {
        return Err(AppError::Conflict(format!("A slot at {start} already exists")));
    }

    let now = Utc::now().naive_utc();
    let capacity = capacity.unwrap_or(slot.capacity);
    // Guarded so a booking landing in between can't end up over capacity
    let result = slot::Entity::update_many()
        .col_expr(slot::Column::StartTime, Expr::value(start.clone()))
        .col_expr(slot::Column::EndTime, Expr::value(end.clone()))
        .col_expr(slot::Column::Capacity, Expr::value(capacity))
        .col_expr(slot::Column::UpdatedAt, Expr::value(now))
        .filter(slot::Column::Id.eq(&id))
        .filter(slot::Column::BookedCount.lte(capacity))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::BadRequest(
            "Capacity cannot be lower than the number of booked seats".to_string(),
        ));
    }

    if start != slot.start_time || end != slot.end_time {
        let moved = appointment::Entity::update_many()
            .col_expr(appointment::Column::StartTime, Expr::value(start))
            .col_expr(appointment::Column::EndTime, Expr::value(end))
            .col_expr(appointment::Column::UpdatedAt, Expr::value(now))
            .filter(appointment::Column::SlotId.eq(&id))
            .exec(&txn)
            .await?;
        tracing::info!(slot_id = %id, appointments = moved.rows_affected, "slot times changed");
    }

    let slot = queries::slots::find_by_id(&txn, &id)
        .await?
        .ok_or(AppError::SlotNotFound)?;
    txn.commit().await?;
    Ok(Json(slot))
}

/// Only slots without bookings can be deleted.
pub async fn delete(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let result = slot::Entity::delete_many()
        .filter(slot::Column::Id.eq(&id))
        .filter(slot::Column::BookedCount.eq(0))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return match queries::slots::find_by_id(&state.db, &id).await? {
            Some(_) => Err(AppError::BadRequest(
                "Slot has bookings and cannot be deleted".to_string(),
            )),
            None => Err(AppError::SlotNotFound),
        };
    }
    tracing::info!(slot_id = %id, "slot deleted");
    Ok(Json(MessageResponse::new("Slot deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_buckets_skip_lunch() {
        assert_eq!(DEFAULT_BUCKETS.first(), Some(&("08:00", "09:00")));
        assert_eq!(DEFAULT_BUCKETS.last(), Some(&("16:00", "17:00")));
        assert!(DEFAULT_BUCKETS.iter().all(|(start, _)| *start != "12:00"));
        assert!(DEFAULT_BUCKETS.iter().all(|(s, e)| validate_times(s, e).is_ok()));
    }

    #[test]
    fn times_are_normalized_and_ordered() {
        assert_eq!(
            validate_times("8:00", "9:30").unwrap(),
            ("08:00".to_string(), "09:30".to_string())
        );
        assert!(validate_times("10:00", "09:00").is_err());
        assert!(validate_times("10:00", "10:00").is_err());
        assert!(validate_times("ten", "11:00").is_err());
    }
}
