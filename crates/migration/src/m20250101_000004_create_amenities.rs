//! Create `amenities`; linked to places through `place_amenity`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Amenities::Table)
                    .if_not_exists()
                    .col(string_len(Amenities::Id, 60).primary_key())
                    .col(string_len(Amenities::Name, 128).not_null())
                    .col(timestamp(Amenities::CreatedAt).not_null())
                    .col(timestamp(Amenities::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Amenities::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Amenities { Table, Id, Name, CreatedAt, UpdatedAt }
