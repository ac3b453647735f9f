use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::book;

/// Free-form JSON notes attached to a book, at most one per book.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "about_books")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub book_id: i32,
  pub about: Json,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "book::Entity",
    from = "Column::BookId",
    to = "book::Column::Id"
  )]
  Book,
}

impl Related<book::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Book.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
