//! Create `users`. The password column holds the argon2 hash and is only
//! read by the storage layer.
use sea_orm_migration::{prelude::*, schema::*};

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
                    .col(string_len(Users::Id, 60).primary_key())
                    .col(string_len(Users::Email, 128).not_null())
                    .col(string_len(Users::Password, 128).not_null())
                    .col(ColumnDef::new(Users::FirstName).string_len(128).null())
                    .col(ColumnDef::new(Users::LastName).string_len(128).null())
                    .col(timestamp(Users::CreatedAt).not_null())
                    .col(timestamp(Users::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Users { Table, Id, Email, Password, FirstName, LastName, CreatedAt, UpdatedAt }
