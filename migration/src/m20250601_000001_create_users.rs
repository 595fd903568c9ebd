use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Role is stored as a short string rather than a native enum so the
        // same migration runs on Postgres and on the sqlite test database.
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::FullName, 100).not_null())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(string_len_null(User::PhoneNumber, 30))
                    .col(string_null(User::ProfileImage))
                    .col(string_len(User::Role, 20).not_null())
                    .col(boolean(User::IsEmailVerified).not_null().default(false))
                    .col(boolean(User::IsBlocked).not_null().default(false))
                    .col(boolean(User::MustChangePassword).not_null().default(false))
                    .col(string_len_null(User::EmailVerifyToken, 64))
                    .col(string_len_null(User::ResetToken, 10))
                    .col(timestamp_with_time_zone_null(User::ResetTokenExpiry))
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(User::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum User {
    Table,
    Id,
    FullName,
    Email,
    PasswordHash,
    PhoneNumber,
    ProfileImage,
    Role,
    IsEmailVerified,
    IsBlocked,
    MustChangePassword,
    EmailVerifyToken,
    ResetToken,
    ResetTokenExpiry,
    CreatedAt,
    UpdatedAt,
}
