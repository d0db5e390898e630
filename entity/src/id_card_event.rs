use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::IdCardStatus;

/// One entry of an ID card's status history.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "id_card_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub id_card_id: String,
    pub status: IdCardStatus,
    pub actor_id: String,
    pub remarks: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::id_card::Entity",
        from = "Column::IdCardId",
        to = "super::id_card::Column::Id"
    )]
    IdCard,
}

impl Related<super::id_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IdCard.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
