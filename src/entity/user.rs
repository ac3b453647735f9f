use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{follow_book, follow_pack, follow_session};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
  #[sea_orm(string_value = "reader")]
  #[default]
  Reader,
  #[sea_orm(string_value = "teacher")]
  Teacher,
  #[sea_orm(string_value = "admin")]
  Admin,
  #[sea_orm(string_value = "assistant")]
  Assistant,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub username: String,
  #[sea_orm(unique)]
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub img: Option<String>,
  pub confirmed: bool,
  pub approved: bool,
  pub role: UserRole,
  /// Reading level, readers only.
  pub level: Option<String>,
  /// Teacher profile.
  pub description: Option<String>,
  pub study_level: Option<String>,
  pub available: bool,
  pub quiz_id: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "follow_pack::Entity")]
  FollowPacks,
  #[sea_orm(has_many = "follow_session::Entity")]
  FollowSessions,
  #[sea_orm(has_many = "follow_book::Entity")]
  FollowBooks,
}

impl Related<follow_pack::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::FollowPacks.def()
  }
}

impl Related<follow_session::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::FollowSessions.def()
  }
}

impl Related<follow_book::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::FollowBooks.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn is_staff(&self) -> bool {
    matches!(self.role, UserRole::Teacher | UserRole::Admin)
  }
}
