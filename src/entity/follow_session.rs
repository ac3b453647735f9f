use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{session, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow_sessions")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i32,
  #[sea_orm(primary_key, auto_increment = false)]
  pub session_id: i32,
  pub approved: bool,
  pub presence: bool,
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
    belongs_to = "session::Entity",
    from = "Column::SessionId",
    to = "session::Column::Id"
  )]
  Session,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<session::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Session.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
