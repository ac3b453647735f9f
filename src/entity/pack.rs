use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{book_pack, code, follow_pack, session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
  #[sea_orm(string_value = "kid")]
  Kid,
  #[sea_orm(string_value = "teenager")]
  Teenager,
  #[sea_orm(string_value = "adult")]
  Adult,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "packs")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub title: String,
  pub level: String,
  pub description: Option<String>,
  pub age: Option<AgeGroup>,
  pub img: Option<String>,
  pub faq: Option<String>,
  /// Access duration in days.
  pub duration: Option<i32>,
  pub book_number: i32,
  pub price: f64,
  pub discount: f64,
  pub public: bool,
  pub invoice_product_id: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "book_pack::Entity")]
  BookPacks,
  #[sea_orm(has_many = "code::Entity")]
  Codes,
  #[sea_orm(has_many = "follow_pack::Entity")]
  FollowPacks,
  #[sea_orm(has_many = "session::Entity")]
  Sessions,
}

impl Related<book_pack::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::BookPacks.def()
  }
}

impl Related<code::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Codes.def()
  }
}

impl Related<follow_pack::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::FollowPacks.def()
  }
}

impl Related<session::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Sessions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
