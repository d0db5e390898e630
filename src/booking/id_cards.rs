use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::AppError;
use entity::sea_orm_active_enums::IdCardStatus;
use entity::{appointment, id_card, id_card_event};

/// Mark the card for an appointment as handed out, creating it on first issue.
pub async fn issue<C: ConnectionTrait>(
    db: &C,
    appointment: &appointment::Model,
    actor_id: &str,
    remarks: Option<String>,
) -> Result<id_card::Model, AppError> {
    let now = Utc::now().naive_utc();
    let existing = id_card::Entity::find()
        .filter(id_card::Column::AppointmentId.eq(&appointment.id))
        .one(db)
        .await?;

    let card = match existing {
        Some(card) if card.status == IdCardStatus::Claimed => return Ok(card),
        Some(card) => {
            let mut active: id_card::ActiveModel = card.into();
            active.status = Set(IdCardStatus::Claimed);
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => {
            id_card::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                appointment_id: Set(appointment.id.clone()),
                user_id: Set(appointment.user_id.clone()),
                status: Set(IdCardStatus::Claimed),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(db)
            .await?
        }
    };

    record_event(db, &card.id, IdCardStatus::Claimed, actor_id, remarks).await?;
    Ok(card)
}

pub async fn mark_returned<C: ConnectionTrait>(
    db: &C,
    card_id: &str,
    actor_id: &str,
    remarks: Option<String>,
) -> Result<id_card::Model, AppError> {
    let card = id_card::Entity::find_by_id(card_id)
        .one(db)
        .await?
        .ok_or(AppError::IdCardNotFound)?;

    if card.status == IdCardStatus::Returned {
        return Err(AppError::BadRequest("ID card already returned".to_string()));
    }

    let mut active: id_card::ActiveModel = card.into();
    active.status = Set(IdCardStatus::Returned);
    active.updated_at = Set(Utc::now().naive_utc());
    let card = active.update(db).await?;

    record_event(db, &card.id, IdCardStatus::Returned, actor_id, remarks).await?;
    Ok(card)
}

pub async fn history<C: ConnectionTrait>(
    db: &C,
    card_id: &str,
) -> Result<Vec<id_card_event::Model>, AppError> {
    Ok(id_card_event::Entity::find()
        .filter(id_card_event::Column::IdCardId.eq(card_id))
        .order_by_asc(id_card_event::Column::CreatedAt)
        .all(db)
        .await?)
}

async fn record_event<C: ConnectionTrait>(
    db: &C,
    card_id: &str,
    status: IdCardStatus,
    actor_id: &str,
    remarks: Option<String>,
) -> Result<(), AppError> {
    id_card_event::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        id_card_id: Set(card_id.to_string()),
        status: Set(status),
        actor_id: Set(actor_id.to_string()),
        remarks: Set(remarks),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await?;
    Ok(())
}
