use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::error::AppError;
use entity::slot;

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: &str) -> Result<Option<slot::Model>, AppError> {
    Ok(slot::Entity::find_by_id(id).one(db).await?)
}

/// Take one seat on a slot. Returns `false` when the slot was already full.
///
/// The capacity check and the increment are a single UPDATE, so two
/// concurrent bookings can never both take the last seat.
pub async fn reserve_seat<C: ConnectionTrait>(db: &C, slot_id: &str) -> Result<bool, AppError> {
    let result = slot::Entity::update_many()
        .col_expr(
            slot::Column::BookedCount,
            Expr::col(slot::Column::BookedCount).add(1),
        )
        .col_expr(slot::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
        .filter(slot::Column::Id.eq(slot_id))
        .filter(Expr::col(slot::Column::BookedCount).lt(Expr::col(slot::Column::Capacity)))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Give back one seat, never going below zero.
pub async fn release_seat<C: ConnectionTrait>(db: &C, slot_id: &str) -> Result<(), AppError> {
    let result = slot::Entity::update_many()
        .col_expr(
            slot::Column::BookedCount,
            Expr::col(slot::Column::BookedCount).sub(1),
        )
        .col_expr(slot::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
        .filter(slot::Column::Id.eq(slot_id))
        .filter(slot::Column::BookedCount.gt(0))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        tracing::warn!(slot_id, "release_seat on a slot with no booked seats");
    }
    Ok(())
}
