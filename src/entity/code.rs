use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{pack, user};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
  #[sea_orm(string_value = "active")]
  #[default]
  Active,
  #[sea_orm(string_value = "used")]
  Used,
  #[sea_orm(string_value = "pending")]
  Pending,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "codes")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub pack_id: i32,
  #[sea_orm(unique)]
  pub code: String,
  pub status: CodeStatus,
  /// Set once the code is redeemed.
  pub user_id: Option<i32>,
  pub created_at: DateTime,
  pub used_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "pack::Entity",
    from = "Column::PackId",
    to = "pack::Column::Id"
  )]
  Pack,
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::UserId",
    to = "user::Column::Id"
  )]
  User,
}

impl Related<pack::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Pack.def()
  }
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
