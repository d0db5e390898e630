use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SchedulingWindows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SchedulingWindows::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SchedulingWindows::StartDate).date().not_null())
                    .col(ColumnDef::new(SchedulingWindows::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(SchedulingWindows::Purpose)
                            .string_len(32)
                            .not_null()
                            .default("ALL"),
                    )
                    .col(
                        ColumnDef::new(SchedulingWindows::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(SchedulingWindows::Remarks).text().null())
                    .col(
                        ColumnDef::new(SchedulingWindows::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SchedulingWindows::UpdatedAt)
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
            .drop_table(Table::drop().table(SchedulingWindows::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SchedulingWindows {
    Table,
    Id,
    StartDate,
    EndDate,
    Purpose,
    IsActive,
    Remarks,
    CreatedAt,
    UpdatedAt,
}
