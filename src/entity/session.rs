use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{book, follow_session, pack, session_quiz, user};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Location {
  #[sea_orm(string_value = "online")]
  #[default]
  Online,
  #[sea_orm(string_value = "classroom")]
  Classroom,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub name: String,
  pub description: Option<String>,
  pub img: Option<String>,
  pub capacity: i32,
  pub book_id: i32,
  pub teacher_id: i32,
  pub pack_id: i32,
  pub location: Location,
  pub start_date: DateTime,
  pub end_date: DateTime,
  pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "book::Entity",
    from = "Column::BookId",
    to = "book::Column::Id"
  )]
  Book,
  #[sea_orm(
    belongs_to = "pack::Entity",
    from = "Column::PackId",
    to = "pack::Column::Id"
  )]
  Pack,
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::TeacherId",
    to = "user::Column::Id"
  )]
  Teacher,
  #[sea_orm(has_many = "follow_session::Entity")]
  FollowSessions,
  #[sea_orm(has_many = "session_quiz::Entity")]
  Quizzes,
}

impl Related<book::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Book.def()
  }
}

impl Related<pack::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Pack.def()
  }
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Teacher.def()
  }
}

impl Related<follow_session::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::FollowSessions.def()
  }
}

impl Related<session_quiz::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Quizzes.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
