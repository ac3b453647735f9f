use sea_orm_migration::prelude::*;

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
          .col(
            ColumnDef::new(Users::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Users::Username).string_len(64).not_null())
          .col(
            ColumnDef::new(Users::Email).string_len(100).not_null().unique_key(),
          )
          .col(ColumnDef::new(Users::PasswordHash).string().not_null())
          .col(ColumnDef::new(Users::Img).string_len(300).null())
          .col(ColumnDef::new(Users::Confirmed).boolean().not_null().default(false))
          .col(ColumnDef::new(Users::Approved).boolean().not_null().default(false))
          .col(
            ColumnDef::new(Users::Role)
              .string()
              .not_null()
              .default("reader"),
          )
          .col(ColumnDef::new(Users::Level).string_len(10).null())
          .col(ColumnDef::new(Users::Description).string_len(400).null())
          .col(ColumnDef::new(Users::StudyLevel).string_len(40).null())
          .col(ColumnDef::new(Users::Available).boolean().not_null().default(true))
          .col(ColumnDef::new(Users::QuizId).string().null())
          .col(ColumnDef::new(Users::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_users_role")
          .table(Users::Table)
          .col(Users::Role)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(TeacherPostulates::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(TeacherPostulates::UserId)
              .integer()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(TeacherPostulates::Description)
              .string_len(400)
              .not_null(),
          )
          .col(ColumnDef::new(TeacherPostulates::StudyLevel).text().not_null())
          .col(
            ColumnDef::new(TeacherPostulates::Selected)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(TeacherPostulates::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_teacher_postulates_user")
              .from(TeacherPostulates::Table, TeacherPostulates::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(TeacherPostulates::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Users {
  Table,
  Id,
  Username,
  Email,
  PasswordHash,
  Img,
  Confirmed,
  Approved,
  Role,
  Level,
  Description,
  StudyLevel,
  Available,
  QuizId,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum TeacherPostulates {
  Table,
  UserId,
  Description,
  StudyLevel,
  Selected,
  CreatedAt,
}
