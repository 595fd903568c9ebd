use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // CreatedBy is a weak back-reference to the creating agent/admin,
        // deliberately without a foreign key: deleting a user must not
        // cascade to the listings they created.
        manager
            .create_table(
                Table::create()
                    .table(Vehicle::Table)
                    .if_not_exists()
                    .col(uuid(Vehicle::Id).primary_key())
                    .col(string_len(Vehicle::Title, 200).not_null())
                    .col(string_len(Vehicle::Category, 50).not_null())
                    .col(double(Vehicle::PricePerDay).not_null())
                    .col(json(Vehicle::Features).not_null())
                    .col(json(Vehicle::ImageUrls).not_null())
                    .col(timestamp_with_time_zone(Vehicle::AvailableFrom).not_null())
                    .col(timestamp_with_time_zone(Vehicle::AvailableTo).not_null())
                    .col(string_len(Vehicle::Location, 100).not_null())
                    .col(uuid(Vehicle::CreatedBy).not_null())
                    .col(timestamp_with_time_zone(Vehicle::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Vehicle::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicle::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vehicle {
    Table,
    Id,
    Title,
    Category,
    PricePerDay,
    Features,
    ImageUrls,
    AvailableFrom,
    AvailableTo,
    Location,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
