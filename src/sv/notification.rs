use crate::{entity::notification, prelude::*, sv};

/// Longest external notification id accepted.
pub const MAX_ID_LEN: usize = 50;

pub struct Notification<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Notification<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn find(
    &self,
    user_id: i32,
    notification_id: &str,
  ) -> Result<Option<notification::Model>> {
    let found = notification::Entity::find()
      .filter(notification::Column::UserId.eq(user_id))
      .filter(notification::Column::NotificationId.eq(notification_id))
      .one(self.db)
      .await?;
    Ok(found)
  }

  /// Records that `notification_id` was sent to the user. Sending the same
  /// one twice is a conflict.
  pub async fn create(
    &self,
    user_id: i32,
    notification_id: Option<&str>,
  ) -> Result<notification::Model> {
    let notification_id = utils::required("notification id", notification_id)?;
    if notification_id.len() > MAX_ID_LEN {
      return Err(Error::InvalidArgs(format!(
        "Notification id is longer than {MAX_ID_LEN} characters"
      )));
    }
    sv::User::new(self.db).get(user_id).await?;

    if self.find(user_id, notification_id).await?.is_some() {
      return Err(Error::Conflict(
        "This notification was already sent to the user".into(),
      ));
    }

    let notification = notification::ActiveModel {
      user_id: Set(user_id),
      notification_id: Set(notification_id.to_string()),
      created_at: Set(utils::now()),
      ..Default::default()
    };
    Ok(notification.insert(self.db).await?)
  }

  pub async fn of_user(&self, user_id: i32) -> Result<Vec<notification::Model>> {
    let notifications = notification::Entity::find()
      .filter(notification::Column::UserId.eq(user_id))
      .order_by_asc(notification::Column::CreatedAt)
      .order_by_asc(notification::Column::Id)
      .all(self.db)
      .await?;
    Ok(notifications)
  }

  pub async fn delete(&self, user_id: i32, notification_id: &str) -> Result<()> {
    let found = self
      .find(user_id, notification_id)
      .await?
      .ok_or(Error::NotificationNotFound)?;
    notification::Entity::delete_by_id(found.id).exec(self.db).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::{fixtures, test_db};

  #[tokio::test]
  async fn test_notifications_once_per_user() {
    let db = test_db::setup().await;
    let alice = fixtures::reader(&db, "alice").await;
    let bob = fixtures::reader(&db, "bob").await;
    let sv = Notification::new(&db);

    sv.create(alice.id, Some("welcome")).await.unwrap();
    sv.create(alice.id, Some("session-reminder")).await.unwrap();
    assert!(matches!(
      sv.create(alice.id, Some("welcome")).await,
      Err(Error::Conflict(_))
    ));
    sv.create(bob.id, Some("welcome")).await.unwrap();

    let ids: Vec<_> = sv
      .of_user(alice.id)
      .await
      .unwrap()
      .into_iter()
      .map(|n| n.notification_id)
      .collect();
    assert_eq!(ids, ["welcome", "session-reminder"]);

    sv.delete(alice.id, "welcome").await.unwrap();
    assert!(matches!(
      sv.delete(alice.id, "welcome").await,
      Err(Error::NotificationNotFound)
    ));
    assert_eq!(sv.of_user(bob.id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_notification_validation() {
    let db = test_db::setup().await;
    let alice = fixtures::reader(&db, "alice").await;
    let sv = Notification::new(&db);

    assert!(matches!(
      sv.create(alice.id, Some("  ")).await,
      Err(Error::InvalidArgs(msg)) if msg == "Notification id is required"
    ));
    let long = "x".repeat(MAX_ID_LEN + 1);
    assert!(matches!(
      sv.create(alice.id, Some(&long)).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      sv.create(404, Some("welcome")).await,
      Err(Error::UserNotFound)
    ));
  }

  #[tokio::test]
  async fn test_deleting_user_drops_notifications() {
    let db = test_db::setup().await;
    let alice = fixtures::reader(&db, "alice").await;
    let sv = Notification::new(&db);

    sv.create(alice.id, Some("welcome")).await.unwrap();
    sv::User::new(&db).delete(alice.id).await.unwrap();

    assert!(sv.of_user(alice.id).await.unwrap().is_empty());
  }
}
