use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Slots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Slots::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Slots::Date).date().not_null())
                    .col(ColumnDef::new(Slots::StartTime).string_len(5).not_null())
                    .col(ColumnDef::new(Slots::EndTime).string_len(5).not_null())
                    .col(ColumnDef::new(Slots::Purpose).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Slots::Capacity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Slots::BookedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Slots::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Slots::UpdatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One bucket per (date, start_time, purpose)
        manager
            .create_index(
                Index::create()
                    .name("idx-slots-date-start_time-purpose")
                    .table(Slots::Table)
                    .col(Slots::Date)
                    .col(Slots::StartTime)
                    .col(Slots::Purpose)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Slots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Slots {
    Table,
    Id,
    Date,
    StartTime,
    EndTime,
    Purpose,
    Capacity,
    BookedCount,
    CreatedAt,
    UpdatedAt,
}
