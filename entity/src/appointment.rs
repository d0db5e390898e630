use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{AppointmentStatus, Purpose};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub slot_id: Option<String>,
    pub purpose: Purpose,
    pub picture_option: Option<String>,
    pub notes: Option<String>,
    pub appointment_date: chrono::NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub status: AppointmentStatus,
    pub contact_email: String,
    pub admin_remarks: Option<String>,
    pub status_updated_at: Option<chrono::NaiveDateTime>,
    pub status_updated_by: Option<String>,
    /// SHA-256 of the single-use check-in token.
    #[serde(skip_serializing)]
    pub checkin_token_hash: Option<String>,
    pub checkin_expires_at: Option<chrono::NaiveDateTime>,
    #[serde(skip_serializing)]
    pub qr_payload: Option<String>,
    pub calendar_event_id: Option<String>,
    pub last_scanned_at: Option<chrono::NaiveDateTime>,
    pub scanned_by: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::slot::Entity",
        from = "Column::SlotId",
        to = "super::slot::Column::Id"
    )]
    Slot,
    #[sea_orm(has_one = "super::id_card::Entity")]
    IdCard,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Slot.def()
    }
}

impl Related<super::id_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IdCard.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
