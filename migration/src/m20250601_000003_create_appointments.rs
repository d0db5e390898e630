use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_users::Users;
use crate::m20250601_000002_create_slots::Slots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appointments::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Appointments::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(Appointments::SlotId).string_len(36).null())
                    .col(ColumnDef::new(Appointments::Purpose).string_len(32).not_null())
                    .col(ColumnDef::new(Appointments::PictureOption).string_len(64).null())
                    .col(ColumnDef::new(Appointments::Notes).text().null())
                    .col(ColumnDef::new(Appointments::AppointmentDate).date().not_null())
                    .col(ColumnDef::new(Appointments::StartTime).string_len(5).not_null())
                    .col(ColumnDef::new(Appointments::EndTime).string_len(5).not_null())
                    .col(
                        ColumnDef::new(Appointments::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending-approval"),
                    )
                    .col(ColumnDef::new(Appointments::ContactEmail).string_len(255).not_null())
                    .col(ColumnDef::new(Appointments::AdminRemarks).text().null())
                    .col(ColumnDef::new(Appointments::StatusUpdatedAt).date_time().null())
                    .col(ColumnDef::new(Appointments::StatusUpdatedBy).string_len(36).null())
                    .col(ColumnDef::new(Appointments::CheckinTokenHash).string_len(64).null())
                    .col(ColumnDef::new(Appointments::CheckinExpiresAt).date_time().null())
                    .col(ColumnDef::new(Appointments::QrPayload).text().null())
                    .col(ColumnDef::new(Appointments::CalendarEventId).string_len(255).null())
                    .col(
                        ColumnDef::new(Appointments::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Appointments::UpdatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-appointments-user_id")
                            .from(Appointments::Table, Appointments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-appointments-slot_id")
                            .from(Appointments::Table, Appointments::SlotId)
                            .to(Slots::Table, Slots::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Daily cap counts by date
        manager
            .create_index(
                Index::create()
                    .name("idx-appointments-appointment_date")
                    .table(Appointments::Table)
                    .col(Appointments::AppointmentDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-appointments-user_id-slot_id")
                    .table(Appointments::Table)
                    .col(Appointments::UserId)
                    .col(Appointments::SlotId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Appointments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Appointments {
    Table,
    Id,
    UserId,
    SlotId,
    Purpose,
    PictureOption,
    Notes,
    AppointmentDate,
    StartTime,
    EndTime,
    Status,
    ContactEmail,
    AdminRemarks,
    StatusUpdatedAt,
    StatusUpdatedBy,
    CheckinTokenHash,
    CheckinExpiresAt,
    QrPayload,
    CalendarEventId,
    CreatedAt,
    UpdatedAt,
}
