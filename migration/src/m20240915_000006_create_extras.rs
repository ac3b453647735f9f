use sea_orm_migration::prelude::*;

use super::{
  m20240915_000001_create_users::Users, m20240915_000002_create_catalog::Books,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(AboutBooks::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(AboutBooks::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(AboutBooks::BookId).integer().not_null().unique_key())
          .col(ColumnDef::new(AboutBooks::About).json().not_null())
          .col(ColumnDef::new(AboutBooks::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_about_books_book")
              .from(AboutBooks::Table, AboutBooks::BookId)
              .to(Books::Table, Books::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Notifications::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Notifications::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Notifications::UserId).integer().not_null())
          .col(
            ColumnDef::new(Notifications::NotificationId)
              .string_len(50)
              .not_null(),
          )
          .col(ColumnDef::new(Notifications::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_notifications_user")
              .from(Notifications::Table, Notifications::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_notifications_user_notification")
          .table(Notifications::Table)
          .col(Notifications::UserId)
          .col(Notifications::NotificationId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Notifications::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(AboutBooks::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum AboutBooks {
  Table,
  Id,
  BookId,
  About,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Notifications {
  Table,
  Id,
  UserId,
  NotificationId,
  CreatedAt,
}
