use sea_orm_migration::prelude::*;

use super::{
  m20240915_000001_create_users::Users,
  m20240915_000002_create_catalog::{Books, Packs},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Sessions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Sessions::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Sessions::Name).string_len(65).not_null().unique_key())
          .col(ColumnDef::new(Sessions::Description).text().null())
          .col(ColumnDef::new(Sessions::Img).string_len(300).null())
          .col(ColumnDef::new(Sessions::Capacity).integer().not_null().default(20))
          .col(ColumnDef::new(Sessions::BookId).integer().not_null())
          .col(ColumnDef::new(Sessions::TeacherId).integer().not_null())
          .col(ColumnDef::new(Sessions::PackId).integer().not_null())
          .col(
            ColumnDef::new(Sessions::Location)
              .string()
              .not_null()
              .default("online"),
          )
          .col(ColumnDef::new(Sessions::StartDate).date_time().not_null())
          .col(ColumnDef::new(Sessions::EndDate).date_time().not_null())
          .col(ColumnDef::new(Sessions::Active).boolean().not_null().default(false))
          .foreign_key(
            ForeignKey::create()
              .name("fk_sessions_book")
              .from(Sessions::Table, Sessions::BookId)
              .to(Books::Table, Books::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_sessions_teacher")
              .from(Sessions::Table, Sessions::TeacherId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_sessions_pack")
              .from(Sessions::Table, Sessions::PackId)
              .to(Packs::Table, Packs::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_sessions_pack")
          .table(Sessions::Table)
          .col(Sessions::PackId)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(SessionQuizzes::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(SessionQuizzes::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(SessionQuizzes::SessionId).integer().not_null())
          .col(ColumnDef::new(SessionQuizzes::QuizToken).string_len(50).not_null())
          .col(ColumnDef::new(SessionQuizzes::ReleaseDate).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_session_quizzes_session")
              .from(SessionQuizzes::Table, SessionQuizzes::SessionId)
              .to(Sessions::Table, Sessions::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(SessionQuizzes::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(Sessions::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Sessions {
  Table,
  Id,
  Name,
  Description,
  Img,
  Capacity,
  BookId,
  TeacherId,
  PackId,
  Location,
  StartDate,
  EndDate,
  Active,
}

#[derive(DeriveIden)]
pub enum SessionQuizzes {
  Table,
  Id,
  SessionId,
  QuizToken,
  ReleaseDate,
}
