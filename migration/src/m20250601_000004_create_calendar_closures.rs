use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CalendarClosures::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CalendarClosures::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CalendarClosures::Date)
                            .date()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CalendarClosures::Remarks).text().null())
                    .col(
                        ColumnDef::new(CalendarClosures::CreatedBy)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CalendarClosures::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CalendarClosures::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CalendarClosures {
    Table,
    Id,
    Date,
    Remarks,
    CreatedBy,
    CreatedAt,
}
