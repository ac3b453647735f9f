use sea_orm::sea_query::Expr;
use serde::Deserialize;

use crate::{
  entity::{
    UserRole, code, follow_book, follow_pack, follow_session, notification,
    session, teacher_postulate, user,
  },
  prelude::*,
};

/// Account created by an administrator.
#[derive(Debug, Deserialize)]
pub struct NewUser {
  pub username: String,
  pub email: String,
  pub password: String,
  #[serde(default)]
  pub img: Option<String>,
  #[serde(default)]
  pub role: UserRole,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub study_level: Option<String>,
  #[serde(default)]
  pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
  pub username: Option<String>,
  pub email: Option<String>,
  pub password: Option<String>,
  pub img: Option<String>,
  pub level: Option<String>,
  pub description: Option<String>,
  pub study_level: Option<String>,
  pub available: Option<bool>,
}

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn ensure_email_free(&self, email: &str, except: Option<i32>) -> Result<()> {
    let mut query = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except {
      query = query.filter(user::Column::Id.ne(id));
    }

    if query.one(self.db).await?.is_some() {
      return Err(Error::Conflict(
        "This email is already used. Please choose another".into(),
      ));
    }
    Ok(())
  }

  /// Self-service sign up. The account stays unconfirmed and unapproved.
  pub async fn register(
    &self,
    username: &str,
    email: &str,
    password: &str,
  ) -> Result<user::Model> {
    let username = utils::required("username", Some(username))?;
    let email = utils::required("email", Some(email))?;
    utils::required("password", Some(password))?;

    self.ensure_email_free(email, None).await?;

    let user = user::ActiveModel {
      username: Set(username.to_string()),
      email: Set(email.to_string()),
      password_hash: Set(utils::hash_password(password)?),
      confirmed: Set(false),
      approved: Set(false),
      role: Set(UserRole::Reader),
      available: Set(true),
      created_at: Set(utils::now()),
      ..Default::default()
    };

    let user = user.insert(self.db).await?;
    info!("Registered reader #{} <{}>", user.id, user.email);
    Ok(user)
  }

  pub async fn create(&self, new: NewUser) -> Result<user::Model> {
    let username = utils::required("username", Some(new.username.as_str()))?;
    let email = utils::required("email", Some(new.email.as_str()))?;
    utils::required("password", Some(new.password.as_str()))?;

    let (description, study_level) = match new.role {
      UserRole::Teacher => (
        Some(utils::required("description", new.description.as_deref())?),
        Some(utils::required("study_level", new.study_level.as_deref())?),
      ),
      UserRole::Admin => {
        return Err(Error::InvalidArgs(
          "Administrators are promoted, not created".into(),
        ));
      }
      _ => (None, None),
    };

    self.ensure_email_free(email, None).await?;

    let user = user::ActiveModel {
      username: Set(username.to_string()),
      email: Set(email.to_string()),
      password_hash: Set(utils::hash_password(&new.password)?),
      img: Set(new.img),
      confirmed: Set(true),
      approved: Set(true),
      role: Set(new.role),
      level: Set(new.level),
      description: Set(description.map(str::to_string)),
      study_level: Set(study_level.map(str::to_string)),
      available: Set(true),
      created_at: Set(utils::now()),
      ..Default::default()
    };

    Ok(user.insert(self.db).await?)
  }

  /// Checks credentials and account state.
  pub async fn login(&self, email: &str, password: &str) -> Result<user::Model> {
    let user = self.by_email(email).await?.ok_or(Error::InvalidCredentials)?;

    if !utils::verify_password(password, &user.password_hash) {
      return Err(Error::InvalidCredentials);
    }
    if !user.confirmed {
      return Err(Error::Forbidden("You don't confirm your account"));
    }
    if !user.approved {
      return Err(Error::Forbidden("Your account has not been approved yet"));
    }

    Ok(user)
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn get(&self, id: i32) -> Result<user::Model> {
    self.by_id(id).await?.ok_or(Error::UserNotFound)
  }

  pub async fn by_email(&self, email: &str) -> Result<Option<user::Model>> {
    let user = user::Entity::find()
      .filter(user::Column::Email.eq(email))
      .one(self.db)
      .await?;
    Ok(user)
  }

  pub async fn by_role(&self, role: UserRole) -> Result<Vec<user::Model>> {
    let users = user::Entity::find()
      .filter(user::Column::Role.eq(role))
      .order_by_asc(user::Column::Id)
      .all(self.db)
      .await?;
    Ok(users)
  }

  pub async fn update(&self, id: i32, update: UserUpdate) -> Result<user::Model> {
    let user = self.get(id).await?;
    let mut active: user::ActiveModel = user.clone().into();

    if let Some(username) = update.username {
      let username = utils::required("username", Some(username.as_str()))?;
      active.username = Set(username.to_string());
    }
    if let Some(email) = update.email {
      let email = utils::required("email", Some(email.as_str()))?;
      self.ensure_email_free(email, Some(id)).await?;
      active.email = Set(email.to_string());
    }
    if let Some(password) = update.password {
      if password.is_empty() {
        return Err(Error::InvalidArgs("Password cannot be empty".into()));
      }
      active.password_hash = Set(utils::hash_password(&password)?);
    }
    if let Some(img) = update.img {
      active.img = Set(Some(img));
    }
    if let Some(level) = update.level {
      active.level = Set(Some(level));
    }
    if user.role == UserRole::Teacher {
      if let Some(description) = update.description {
        active.description = Set(Some(description));
      }
      if let Some(study_level) = update.study_level {
        active.study_level = Set(Some(study_level));
      }
      if let Some(available) = update.available {
        active.available = Set(available);
      }
    }

    Ok(active.update(self.db).await?)
  }

  pub async fn set_quiz_id(&self, id: i32, quiz_id: String) -> Result<()> {
    let user = self.get(id).await?;
    user::ActiveModel { quiz_id: Set(Some(quiz_id)), ..user.into() }
      .update(self.db)
      .await?;
    Ok(())
  }

  /// Marks the account confirmed and approved so it can log in.
  pub async fn approve(&self, id: i32) -> Result<user::Model> {
    let user = self.get(id).await?;
    let user = user::ActiveModel {
      confirmed: Set(true),
      approved: Set(true),
      ..user.into()
    }
    .update(self.db)
    .await?;
    Ok(user)
  }

  /// Self-service deletion, guarded by the account password.
  pub async fn delete_account(&self, id: i32, password: &str) -> Result<()> {
    let user = self.get(id).await?;
    if !utils::verify_password(password, &user.password_hash) {
      return Err(Error::InvalidCredentials);
    }
    self.delete(id).await
  }

  /// Removes a user and every enrollment row that points at them.
  /// Redeemed codes keep their status but lose the user binding.
  pub async fn delete(&self, id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    let user = user::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    let teaching = session::Entity::find()
      .filter(session::Column::TeacherId.eq(id))
      .count(&txn)
      .await?;
    if teaching > 0 {
      return Err(Error::Conflict(format!(
        "User still teaches {teaching} session(s)"
      )));
    }

    follow_session::Entity::delete_many()
      .filter(follow_session::Column::UserId.eq(id))
      .exec(&txn)
      .await?;
    follow_pack::Entity::delete_many()
      .filter(follow_pack::Column::UserId.eq(id))
      .exec(&txn)
      .await?;
    follow_book::Entity::delete_many()
      .filter(follow_book::Column::UserId.eq(id))
      .exec(&txn)
      .await?;
    notification::Entity::delete_many()
      .filter(notification::Column::UserId.eq(id))
      .exec(&txn)
      .await?;
    teacher_postulate::Entity::delete_by_id(id).exec(&txn).await?;
    code::Entity::update_many()
      .col_expr(code::Column::UserId, Expr::value(Option::<i32>::None))
      .filter(code::Column::UserId.eq(id))
      .exec(&txn)
      .await?;

    user::Entity::delete_by_id(user.id).exec(&txn).await?;

    txn.commit().await?;
    info!("Deleted user #{id}");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::{fixtures, test_db};

  #[tokio::test]
  async fn test_register_and_login() {
    let db = test_db::setup().await;
    let sv = User::new(&db);

    let user = sv.register("alice", "alice@iread.test", "pw").await.unwrap();
    assert_eq!(user.role, UserRole::Reader);
    assert!(!user.confirmed);

    assert!(matches!(
      sv.login("alice@iread.test", "pw").await,
      Err(Error::Forbidden(_))
    ));

    sv.approve(user.id).await.unwrap();
    let logged = sv.login("alice@iread.test", "pw").await.unwrap();
    assert_eq!(logged.id, user.id);

    assert!(matches!(
      sv.login("alice@iread.test", "wrong").await,
      Err(Error::InvalidCredentials)
    ));
    assert!(matches!(
      sv.login("nobody@iread.test", "pw").await,
      Err(Error::InvalidCredentials)
    ));
  }

  #[tokio::test]
  async fn test_duplicate_email() {
    let db = test_db::setup().await;
    let sv = User::new(&db);

    sv.register("bob", "bob@iread.test", "pw").await.unwrap();

    assert!(matches!(
      sv.register("bobby", "bob@iread.test", "pw").await,
      Err(Error::Conflict(_))
    ));
  }

  #[tokio::test]
  async fn test_create_teacher_requires_profile() {
    let db = test_db::setup().await;

    let res = User::new(&db)
      .create(NewUser {
        username: "carol".into(),
        email: "carol@iread.test".into(),
        password: "pw".into(),
        img: None,
        role: UserRole::Teacher,
        description: None,
        study_level: None,
        level: None,
      })
      .await;

    assert!(matches!(res, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn test_update_email_uniqueness() {
    let db = test_db::setup().await;
    let sv = User::new(&db);

    let a = fixtures::reader(&db, "a").await;
    fixtures::reader(&db, "b").await;

    let taken = sv
      .update(a.id, UserUpdate {
        email: Some("b@iread.test".into()),
        ..Default::default()
      })
      .await;
    assert!(matches!(taken, Err(Error::Conflict(_))));

    let empty = sv
      .update(a.id, UserUpdate {
        password: Some(String::new()),
        ..Default::default()
      })
      .await;
    assert!(matches!(empty, Err(Error::InvalidArgs(_))));

    let renamed = sv
      .update(a.id, UserUpdate {
        username: Some("ann".into()),
        ..Default::default()
      })
      .await
      .unwrap();
    assert_eq!(renamed.username, "ann");
  }

  #[tokio::test]
  async fn test_delete_account_checks_password() {
    let db = test_db::setup().await;
    let sv = User::new(&db);

    let user = fixtures::reader(&db, "dave").await;

    assert!(matches!(
      sv.delete_account(user.id, "nope").await,
      Err(Error::InvalidCredentials)
    ));

    sv.delete_account(user.id, "secret").await.unwrap();
    assert!(sv.by_id(user.id).await.unwrap().is_none());
  }
}
