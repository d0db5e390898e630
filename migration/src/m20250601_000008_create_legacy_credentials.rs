use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LegacyCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LegacyCredentials::StudentId)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LegacyCredentials::Email).string_len(255).not_null())
                    .col(ColumnDef::new(LegacyCredentials::Name).string_len(255).null())
                    .col(ColumnDef::new(LegacyCredentials::PasswordHash).text().not_null())
                    .col(ColumnDef::new(LegacyCredentials::ClaimedAt).date_time().null())
                    .col(
                        ColumnDef::new(LegacyCredentials::ImportedAt)
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
            .drop_table(Table::drop().table(LegacyCredentials::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LegacyCredentials {
    Table,
    StudentId,
    Email,
    Name,
    PasswordHash,
    ClaimedAt,
    ImportedAt,
}
