//! Create `states`, the root of the geography cascade.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(States::Table)
                    .if_not_exists()
                    .col(string_len(States::Id, 60).primary_key())
                    .col(string_len(States::Name, 128).not_null())
                    .col(timestamp(States::CreatedAt).not_null())
                    .col(timestamp(States::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(States::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum States { Table, Id, Name, CreatedAt, UpdatedAt }
