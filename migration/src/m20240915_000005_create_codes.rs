use sea_orm_migration::prelude::*;

use super::{
  m20240915_000001_create_users::Users, m20240915_000002_create_catalog::Packs,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Codes::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Codes::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Codes::PackId).integer().not_null())
          .col(ColumnDef::new(Codes::Code).string_len(64).not_null().unique_key())
          .col(ColumnDef::new(Codes::Status).string().not_null().default("active"))
          .col(ColumnDef::new(Codes::UserId).integer().null())
          .col(ColumnDef::new(Codes::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Codes::UsedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_codes_pack")
              .from(Codes::Table, Codes::PackId)
              .to(Packs::Table, Packs::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_codes_user")
              .from(Codes::Table, Codes::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_codes_pack")
          .table(Codes::Table)
          .col(Codes::PackId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Codes::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Codes {
  Table,
  Id,
  PackId,
  Code,
  Status,
  UserId,
  CreatedAt,
  UsedAt,
}
