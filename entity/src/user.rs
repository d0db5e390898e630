use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::Role;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub student_id: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: Role,
    #[sea_orm(unique)]
    pub google_id: Option<String>,
    #[serde(skip_serializing)]
    pub google_access_token: Option<String>,
    #[serde(skip_serializing)]
    pub google_refresh_token: Option<String>,
    #[serde(skip_serializing)]
    pub google_token_expires_at: Option<chrono::NaiveDateTime>,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<chrono::NaiveDateTime>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::appointment::Entity")]
    Appointments,
    #[sea_orm(has_many = "super::id_card::Entity")]
    IdCards,
}

impl Related<super::appointment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointments.def()
    }
}

impl Related<super::id_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IdCards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
