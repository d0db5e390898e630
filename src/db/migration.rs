use ::migration::{Migrator, MigratorTrait};
use sea_orm::DbErr;

use super::pool::Db;

pub async fn run(db: &Db) -> Result<(), DbErr> {
    Migrator::up(db, None).await
}
