use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{book, pack, user};

/// A book unlocked by a user through one of their packs.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow_books")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i32,
  #[sea_orm(primary_key, auto_increment = false)]
  pub book_id: i32,
  #[sea_orm(primary_key, auto_increment = false)]
  pub pack_id: i32,
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
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
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

impl ActiveModelBehavior for ActiveModel {}
