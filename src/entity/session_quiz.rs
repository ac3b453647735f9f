use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::session;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "session_quizzes")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub session_id: i32,
  pub quiz_token: String,
  pub release_date: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "session::Entity",
    from = "Column::SessionId",
    to = "session::Column::Id"
  )]
  Session,
}

impl Related<session::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Session.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
