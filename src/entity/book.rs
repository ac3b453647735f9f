use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{book_pack, session};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub title: String,
  pub author: String,
  pub description: Option<String>,
  pub img: Option<String>,
  pub release_date: Option<Date>,
  pub page_number: Option<i32>,
  pub category: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "book_pack::Entity")]
  BookPacks,
  #[sea_orm(has_many = "session::Entity")]
  Sessions,
}

impl Related<book_pack::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::BookPacks.def()
  }
}

impl Related<session::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Sessions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
