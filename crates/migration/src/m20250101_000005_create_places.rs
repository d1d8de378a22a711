//! Create `places` with cascading FKs to `cities` and `users`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Places::Table)
                    .if_not_exists()
                    .col(string_len(Places::Id, 60).primary_key())
                    .col(string_len(Places::CityId, 60).not_null())
                    .col(string_len(Places::UserId, 60).not_null())
                    .col(string_len(Places::Name, 128).not_null())
                    .col(ColumnDef::new(Places::Description).string_len(1024).null())
                    .col(integer(Places::NumberRooms).not_null().default(0))
                    .col(integer(Places::NumberBathrooms).not_null().default(0))
                    .col(integer(Places::MaxGuest).not_null().default(0))
                    .col(integer(Places::PriceByNight).not_null().default(0))
                    .col(ColumnDef::new(Places::Latitude).double().null())
                    .col(ColumnDef::new(Places::Longitude).double().null())
                    .col(timestamp(Places::CreatedAt).not_null())
                    .col(timestamp(Places::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_places_city")
                            .from(Places::Table, Places::CityId)
                            .to(Cities::Table, Cities::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_places_user")
                            .from(Places::Table, Places::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Places::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Places {
    Table,
    Id,
    CityId,
    UserId,
    Name,
    Description,
    NumberRooms,
    NumberBathrooms,
    MaxGuest,
    PriceByNight,
    Latitude,
    Longitude,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Cities { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }
