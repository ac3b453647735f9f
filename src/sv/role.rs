//! Role changes are a tag update on the user row; the id never moves.

use serde::Serialize;

use crate::{
  entity::{UserRole, follow_pack, follow_session, teacher_postulate, user},
  prelude::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Application {
  Pending,
  Accepted,
}

pub struct Role<'a> {
  db: &'a DatabaseConnection,
}

async fn load<C: ConnectionTrait>(conn: &C, id: i32) -> Result<user::Model> {
  user::Entity::find_by_id(id).one(conn).await?.ok_or(Error::UserNotFound)
}

async fn drop_follows<C: ConnectionTrait>(conn: &C, id: i32) -> Result<()> {
  follow_session::Entity::delete_many()
    .filter(follow_session::Column::UserId.eq(id))
    .exec(conn)
    .await?;
  follow_pack::Entity::delete_many()
    .filter(follow_pack::Column::UserId.eq(id))
    .exec(conn)
    .await?;
  Ok(())
}

impl<'a> Role<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn apply(
    &self,
    user_id: i32,
    description: &str,
    study_level: &str,
  ) -> Result<teacher_postulate::Model> {
    let description = utils::required("description", Some(description))?;
    let study_level = utils::required("study_level", Some(study_level))?;

    let user = load(self.db, user_id).await?;
    if user.role != UserRole::Reader {
      return Err(Error::Forbidden("Only readers can apply for a teacher job"));
    }

    if teacher_postulate::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .is_some()
    {
      return Err(Error::Conflict("Application already submitted".into()));
    }

    let postulate = teacher_postulate::ActiveModel {
      user_id: Set(user_id),
      description: Set(description.to_string()),
      study_level: Set(study_level.to_string()),
      selected: Set(false),
      created_at: Set(utils::now()),
    };

    Ok(postulate.insert(self.db).await?)
  }

  pub async fn application(&self, user_id: i32) -> Result<Application> {
    let user = load(self.db, user_id).await?;
    if user.role == UserRole::Teacher {
      return Ok(Application::Accepted);
    }

    teacher_postulate::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .map(|_| Application::Pending)
      .ok_or(Error::PostulateNotFound)
  }

  pub async fn applications(
    &self,
  ) -> Result<Vec<(teacher_postulate::Model, Option<user::Model>)>> {
    let list = teacher_postulate::Entity::find()
      .find_also_related(user::Entity)
      .order_by_asc(teacher_postulate::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(list)
  }

  /// Reader becomes teacher with the profile from their application.
  pub async fn accept(&self, user_id: i32) -> Result<user::Model> {
    let txn = self.db.begin().await?;

    let user = load(&txn, user_id).await?;
    if user.role != UserRole::Reader {
      return Err(Error::Conflict("User is not a reader".into()));
    }

    let postulate = teacher_postulate::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::PostulateNotFound)?;

    let user = user::ActiveModel {
      role: Set(UserRole::Teacher),
      confirmed: Set(true),
      description: Set(Some(postulate.description.clone())),
      study_level: Set(Some(postulate.study_level.clone())),
      available: Set(true),
      ..user.into()
    }
    .update(&txn)
    .await?;

    teacher_postulate::Entity::delete_by_id(user_id).exec(&txn).await?;

    txn.commit().await?;
    info!("User #{user_id} switched to teacher");
    Ok(user)
  }

  pub async fn reject(&self, user_id: i32) -> Result<()> {
    let res =
      teacher_postulate::Entity::delete_by_id(user_id).exec(self.db).await?;
    if res.rows_affected == 0 {
      return Err(Error::PostulateNotFound);
    }
    Ok(())
  }

  pub async fn revoke_teacher(&self, user_id: i32) -> Result<user::Model> {
    let user = load(self.db, user_id).await?;
    if user.role != UserRole::Teacher {
      return Err(Error::Conflict("User is not a teacher".into()));
    }

    let user = user::ActiveModel {
      role: Set(UserRole::Reader),
      description: Set(None),
      study_level: Set(None),
      ..user.into()
    }
    .update(self.db)
    .await?;

    info!("User #{user_id} is no longer a teacher");
    Ok(user)
  }

  /// Admins do not enroll: pack and session follows are dropped.
  pub async fn promote_admin(&self, user_id: i32) -> Result<user::Model> {
    let txn = self.db.begin().await?;

    let user = load(&txn, user_id).await?;
    if user.role == UserRole::Admin {
      return Err(Error::Conflict("User is already an admin".into()));
    }

    drop_follows(&txn, user_id).await?;
    teacher_postulate::Entity::delete_by_id(user_id).exec(&txn).await?;

    let user = user::ActiveModel {
      role: Set(UserRole::Admin),
      confirmed: Set(true),
      approved: Set(true),
      ..user.into()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;
    info!("User #{user_id} promoted to admin");
    Ok(user)
  }

  pub async fn revoke_admin(&self, user_id: i32) -> Result<user::Model> {
    let txn = self.db.begin().await?;

    let user = load(&txn, user_id).await?;
    if user.role != UserRole::Admin {
      return Err(Error::Conflict("User is not an admin".into()));
    }

    drop_follows(&txn, user_id).await?;

    let user = user::ActiveModel {
      role: Set(UserRole::Reader),
      description: Set(None),
      study_level: Set(None),
      ..user.into()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;
    info!("User #{user_id} is no longer an admin");
    Ok(user)
  }
}
