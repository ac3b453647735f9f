use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{pack, user};

/// Pack enrollment. Pending until `approved`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow_packs")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i32,
  #[sea_orm(primary_key, auto_increment = false)]
  pub pack_id: i32,
  pub approved: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::UserId",
    to = "user::Column::Id"
  )]
  User,
  #[sea_orm(
    belongs_to = "pack::Entity",
    from = "Column::PackId",
    to = "pack::Column::Id"
  )]
  Pack,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<pack::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Pack.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
