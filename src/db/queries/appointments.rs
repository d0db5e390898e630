use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::error::AppError;
use entity::appointment;
use entity::sea_orm_active_enums::AppointmentStatus;

/// Statuses that occupy a seat, as a filter list.
pub fn seat_holding_statuses() -> Vec<AppointmentStatus> {
    use sea_orm::Iterable;
    AppointmentStatus::iter().filter(|s| s.holds_seat()).collect()
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<Option<appointment::Model>, AppError> {
    Ok(appointment::Entity::find_by_id(id).one(db).await?)
}

pub async fn count_seat_holding_on_date<C: ConnectionTrait>(
    db: &C,
    date: NaiveDate,
) -> Result<u64, AppError> {
    Ok(appointment::Entity::find()
        .filter(appointment::Column::AppointmentDate.eq(date))
        .filter(appointment::Column::Status.is_in(seat_holding_statuses()))
        .count(db)
        .await?)
}

pub async fn find_user_booking_for_slot<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    slot_id: &str,
) -> Result<Option<appointment::Model>, AppError> {
    Ok(appointment::Entity::find()
        .filter(appointment::Column::UserId.eq(user_id))
        .filter(appointment::Column::SlotId.eq(slot_id))
        .filter(appointment::Column::Status.is_in(seat_holding_statuses()))
        .one(db)
        .await?)
}
