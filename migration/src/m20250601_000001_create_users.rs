use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Users::StudentId)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).text().null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(16)
                            .not_null()
                            .default("student"),
                    )
                    .col(
                        ColumnDef::new(Users::GoogleId)
                            .string_len(255)
                            .unique_key()
                            .null(),
                    )
                    .col(ColumnDef::new(Users::GoogleAccessToken).text().null())
                    .col(ColumnDef::new(Users::GoogleRefreshToken).text().null())
                    .col(ColumnDef::new(Users::GoogleTokenExpiresAt).date_time().null())
                    .col(ColumnDef::new(Users::ResetTokenHash).string_len(64).null())
                    .col(ColumnDef::new(Users::ResetTokenExpiresAt).date_time().null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
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
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Name,
    StudentId,
    Email,
    PasswordHash,
    Role,
    GoogleId,
    GoogleAccessToken,
    GoogleRefreshToken,
    GoogleTokenExpiresAt,
    ResetTokenHash,
    ResetTokenExpiresAt,
    CreatedAt,
    UpdatedAt,
}
