use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{book, pack};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "book_packs")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub pack_id: i32,
  #[sea_orm(primary_key, auto_increment = false)]
  pub book_id: i32,
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
    belongs_to = "book::Entity",
    from = "Column::BookId",
    to = "book::Column::Id"
  )]
  Book,
}

impl Related<pack::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Pack.def()
  }
}

impl Related<book::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Book.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
