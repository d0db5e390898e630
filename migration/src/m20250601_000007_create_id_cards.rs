use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_users::Users;
use crate::m20250601_000003_create_appointments::Appointments;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IdCards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IdCards::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IdCards::AppointmentId)
                            .string_len(36)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(IdCards::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(IdCards::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(IdCards::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(IdCards::UpdatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-id_cards-appointment_id")
                            .from(IdCards::Table, IdCards::AppointmentId)
                            .to(Appointments::Table, Appointments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-id_cards-user_id")
                            .from(IdCards::Table, IdCards::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IdCardEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IdCardEvents::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IdCardEvents::IdCardId).string_len(36).not_null())
                    .col(ColumnDef::new(IdCardEvents::Status).string_len(16).not_null())
                    .col(ColumnDef::new(IdCardEvents::ActorId).string_len(36).not_null())
                    .col(ColumnDef::new(IdCardEvents::Remarks).text().null())
                    .col(
                        ColumnDef::new(IdCardEvents::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-id_card_events-id_card_id")
                            .from(IdCardEvents::Table, IdCardEvents::IdCardId)
                            .to(IdCards::Table, IdCards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IdCardEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IdCards::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IdCards {
    Table,
    Id,
    AppointmentId,
    UserId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum IdCardEvents {
    Table,
    Id,
    IdCardId,
    Status,
    ActorId,
    Remarks,
    CreatedAt,
}
