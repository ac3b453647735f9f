use sea_orm_migration::prelude::*;

use super::{
  m20240915_000001_create_users::Users,
  m20240915_000002_create_catalog::{Books, Packs},
  m20240915_000003_create_sessions::Sessions,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(FollowPacks::Table)
          .if_not_exists()
          .col(ColumnDef::new(FollowPacks::UserId).integer().not_null())
          .col(ColumnDef::new(FollowPacks::PackId).integer().not_null())
          .col(ColumnDef::new(FollowPacks::Approved).boolean().not_null().default(false))
          .col(ColumnDef::new(FollowPacks::CreatedAt).date_time().not_null())
          .primary_key(
            Index::create().col(FollowPacks::UserId).col(FollowPacks::PackId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_follow_packs_user")
              .from(FollowPacks::Table, FollowPacks::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_follow_packs_pack")
              .from(FollowPacks::Table, FollowPacks::PackId)
              .to(Packs::Table, Packs::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(FollowSessions::Table)
          .if_not_exists()
          .col(ColumnDef::new(FollowSessions::UserId).integer().not_null())
          .col(ColumnDef::new(FollowSessions::SessionId).integer().not_null())
          .col(
            ColumnDef::new(FollowSessions::Approved)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(FollowSessions::Presence)
              .boolean()
              .not_null()
              .default(false),
          )
          .primary_key(
            Index::create()
              .col(FollowSessions::UserId)
              .col(FollowSessions::SessionId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_follow_sessions_user")
              .from(FollowSessions::Table, FollowSessions::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_follow_sessions_session")
              .from(FollowSessions::Table, FollowSessions::SessionId)
              .to(Sessions::Table, Sessions::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(FollowBooks::Table)
          .if_not_exists()
          .col(ColumnDef::new(FollowBooks::UserId).integer().not_null())
          .col(ColumnDef::new(FollowBooks::BookId).integer().not_null())
          .col(ColumnDef::new(FollowBooks::PackId).integer().not_null())
          .primary_key(
            Index::create()
              .col(FollowBooks::UserId)
              .col(FollowBooks::BookId)
              .col(FollowBooks::PackId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_follow_books_user")
              .from(FollowBooks::Table, FollowBooks::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_follow_books_book")
              .from(FollowBooks::Table, FollowBooks::BookId)
              .to(Books::Table, Books::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_follow_books_pack")
              .from(FollowBooks::Table, FollowBooks::PackId)
              .to(Packs::Table, Packs::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(FollowBooks::Table).to_owned()).await?;
    manager
      .drop_table(Table::drop().table(FollowSessions::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(FollowPacks::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum FollowPacks {
  Table,
  UserId,
  PackId,
  Approved,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum FollowSessions {
  Table,
  UserId,
  SessionId,
  Approved,
  Presence,
}

#[derive(DeriveIden)]
pub enum FollowBooks {
  Table,
  UserId,
  BookId,
  PackId,
}
