use serde::Serialize;

use crate::{
  entity::{book, follow_book, follow_pack, follow_session, pack, session, user},
  prelude::*,
  sv::{self, session::SessionView},
};

#[derive(Debug, Serialize)]
pub struct PackFollowView {
  #[serde(flatten)]
  pub follow: follow_pack::Model,
  pub username: Option<String>,
  pub email: Option<String>,
  pub pack_title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionFollowView {
  #[serde(flatten)]
  pub follow: follow_session::Model,
  pub username: Option<String>,
  pub email: Option<String>,
  pub session_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FollowedPack {
  #[serde(flatten)]
  pub pack: pack::Model,
  pub approved: bool,
}

/// Upcoming sessions of a reader, split by approval.
#[derive(Debug, Serialize)]
pub struct Dashboard {
  pub pending: Vec<SessionView>,
  pub confirmed: Vec<SessionView>,
}

/// Approved follows of a session.
pub(crate) async fn confirmed<C: ConnectionTrait>(
  conn: &C,
  session_id: i32,
) -> Result<u64> {
  let count = follow_session::Entity::find()
    .filter(follow_session::Column::SessionId.eq(session_id))
    .filter(follow_session::Column::Approved.eq(true))
    .count(conn)
    .await?;
  Ok(count)
}

async fn ensure_entitled<C: ConnectionTrait>(
  conn: &C,
  user_id: i32,
  pack_id: i32,
) -> Result<()> {
  let entitled = follow_pack::Entity::find_by_id((user_id, pack_id))
    .one(conn)
    .await?
    .is_some_and(|f| f.approved);
  if !entitled {
    return Err(Enroll::PackNotApproved.into());
  }
  Ok(())
}

async fn unlock_book<C: ConnectionTrait>(
  conn: &C,
  user_id: i32,
  session: &session::Model,
) -> Result<()> {
  let key = (user_id, session.book_id, session.pack_id);
  if follow_book::Entity::find_by_id(key).one(conn).await?.is_none() {
    follow_book::ActiveModel {
      user_id: Set(user_id),
      book_id: Set(session.book_id),
      pack_id: Set(session.pack_id),
    }
    .insert(conn)
    .await?;
  }
  Ok(())
}

pub struct Follow<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Follow<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Pending pack follow. Returns the existing row untouched when the user
  /// already follows the pack.
  pub async fn request_pack(
    &self,
    user_id: i32,
    pack_id: i32,
  ) -> Result<(follow_pack::Model, bool)> {
    user::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .ok_or(Error::UserNotFound)?;
    pack::Entity::find_by_id(pack_id)
      .one(self.db)
      .await?
      .ok_or(Error::PackNotFound)?;

    if let Some(follow) =
      follow_pack::Entity::find_by_id((user_id, pack_id)).one(self.db).await?
    {
      return Ok((follow, false));
    }

    let follow = follow_pack::ActiveModel {
      user_id: Set(user_id),
      pack_id: Set(pack_id),
      approved: Set(false),
      created_at: Set(utils::now()),
    }
    .insert(self.db)
    .await?;

    debug!("User #{user_id} requested pack #{pack_id}");
    Ok((follow, true))
  }

  pub async fn unfollow_pack(&self, user_id: i32, pack_id: i32) -> Result<()> {
    let res = follow_pack::Entity::delete_by_id((user_id, pack_id))
      .exec(self.db)
      .await?;
    if res.rows_affected == 0 {
      return Err(Error::FollowNotFound);
    }
    Ok(())
  }

  pub async fn set_pack_approval(
    &self,
    user_id: i32,
    pack_id: i32,
    approved: bool,
  ) -> Result<follow_pack::Model> {
    let follow = follow_pack::Entity::find_by_id((user_id, pack_id))
      .one(self.db)
      .await?
      .ok_or(Error::FollowNotFound)?;

    let follow =
      follow_pack::ActiveModel { approved: Set(approved), ..follow.into() }
        .update(self.db)
        .await?;
    Ok(follow)
  }

  /// All pack follows, or those of one pack.
  pub async fn pack_follows(
    &self,
    pack_id: Option<i32>,
  ) -> Result<Vec<PackFollowView>> {
    let mut query = follow_pack::Entity::find();
    if let Some(pack_id) = pack_id {
      query = query.filter(follow_pack::Column::PackId.eq(pack_id));
    }
    let follows = query
      .order_by_asc(follow_pack::Column::CreatedAt)
      .all(self.db)
      .await?;

    let users = self.users(follows.iter().map(|f| f.user_id)).await?;
    let packs: HashMap<i32, String> = pack::Entity::find()
      .filter(pack::Column::Id.is_in(follows.iter().map(|f| f.pack_id)))
      .all(self.db)
      .await?
      .into_iter()
      .map(|p| (p.id, p.title))
      .collect();

    let views = follows
      .into_iter()
      .map(|follow| {
        let user = users.get(&follow.user_id);
        PackFollowView {
          username: user.map(|u| u.username.clone()),
          email: user.map(|u| u.email.clone()),
          pack_title: packs.get(&follow.pack_id).cloned(),
          follow,
        }
      })
      .collect();
    Ok(views)
  }

  pub async fn followed_packs(&self, user_id: i32) -> Result<Vec<FollowedPack>> {
    let packs = follow_pack::Entity::find()
      .filter(follow_pack::Column::UserId.eq(user_id))
      .find_also_related(pack::Entity)
      .all(self.db)
      .await?
      .into_iter()
      .filter_map(|(follow, pack)| {
        pack.map(|pack| FollowedPack { pack, approved: follow.approved })
      })
      .collect();
    Ok(packs)
  }

  pub async fn readers_in_pack(&self, pack_id: i32) -> Result<Vec<user::Model>> {
    let ids: Vec<i32> = follow_pack::Entity::find()
      .filter(follow_pack::Column::PackId.eq(pack_id))
      .filter(follow_pack::Column::Approved.eq(true))
      .all(self.db)
      .await?
      .into_iter()
      .map(|f| f.user_id)
      .collect();
    self.users_ordered(ids).await
  }

  /// Admits the user to a session they are entitled to while seats remain.
  ///
  /// Requires an approved follow of the session's pack. On success the
  /// session's book is unlocked for the user through that pack.
  pub async fn enroll(
    &self,
    user_id: i32,
    session_id: i32,
  ) -> Result<follow_session::Model> {
    let txn = self.db.begin().await?;

    let session = session::Entity::find_by_id(session_id)
      .one(&txn)
      .await?
      .ok_or(Error::SessionNotFound)?;
    user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    ensure_entitled(&txn, user_id, session.pack_id).await?;

    let existing = follow_session::Entity::find_by_id((user_id, session_id))
      .one(&txn)
      .await?;
    if existing.as_ref().is_some_and(|f| f.approved) {
      return Err(Enroll::Already.into());
    }

    if confirmed(&txn, session_id).await? >= session.capacity as u64 {
      return Err(Enroll::Full.into());
    }

    let follow = match existing {
      Some(follow) => {
        follow_session::ActiveModel { approved: Set(true), ..follow.into() }
          .update(&txn)
          .await?
      }
      None => {
        follow_session::ActiveModel {
          user_id: Set(user_id),
          session_id: Set(session_id),
          approved: Set(true),
          presence: Set(false),
        }
        .insert(&txn)
        .await?
      }
    };
    unlock_book(&txn, user_id, &session).await?;

    txn.commit().await?;
    info!("User #{user_id} enrolled in session #{session_id}");
    Ok(follow)
  }

  pub async fn cancel(&self, user_id: i32, session_id: i32) -> Result<()> {
    let res = follow_session::Entity::delete_by_id((user_id, session_id))
      .exec(self.db)
      .await?;
    if res.rows_affected == 0 {
      return Err(Error::FollowNotFound);
    }
    Ok(())
  }

  /// Approving takes a seat, so it fails once the session is full or the
  /// reader lost access to the pack.
  pub async fn set_session_approval(
    &self,
    user_id: i32,
    session_id: i32,
    approved: bool,
  ) -> Result<follow_session::Model> {
    let txn = self.db.begin().await?;

    let follow = follow_session::Entity::find_by_id((user_id, session_id))
      .one(&txn)
      .await?
      .ok_or(Error::FollowNotFound)?;

    if approved && !follow.approved {
      let session = session::Entity::find_by_id(session_id)
        .one(&txn)
        .await?
        .ok_or(Error::SessionNotFound)?;
      ensure_entitled(&txn, user_id, session.pack_id).await?;
      if confirmed(&txn, session_id).await? >= session.capacity as u64 {
        return Err(Enroll::Full.into());
      }
      unlock_book(&txn, user_id, &session).await?;
    }

    let follow =
      follow_session::ActiveModel { approved: Set(approved), ..follow.into() }
        .update(&txn)
        .await?;

    txn.commit().await?;
    Ok(follow)
  }

  pub async fn session_follows(
    &self,
    session_id: Option<i32>,
  ) -> Result<Vec<SessionFollowView>> {
    let mut query = follow_session::Entity::find();
    if let Some(session_id) = session_id {
      query = query.filter(follow_session::Column::SessionId.eq(session_id));
    }
    let follows = query.all(self.db).await?;

    let users = self.users(follows.iter().map(|f| f.user_id)).await?;
    let sessions: HashMap<i32, String> = session::Entity::find()
      .filter(session::Column::Id.is_in(follows.iter().map(|f| f.session_id)))
      .all(self.db)
      .await?
      .into_iter()
      .map(|s| (s.id, s.name))
      .collect();

    let views = follows
      .into_iter()
      .map(|follow| {
        let user = users.get(&follow.user_id);
        SessionFollowView {
          username: user.map(|u| u.username.clone()),
          email: user.map(|u| u.email.clone()),
          session_name: sessions.get(&follow.session_id).cloned(),
          follow,
        }
      })
      .collect();
    Ok(views)
  }

  pub async fn set_presence(
    &self,
    user_id: i32,
    session_id: i32,
    presence: bool,
  ) -> Result<follow_session::Model> {
    let follow = follow_session::Entity::find_by_id((user_id, session_id))
      .one(self.db)
      .await?
      .ok_or(Error::FollowNotFound)?;
    if !follow.approved {
      return Err(Error::InvalidArgs("Reader is not confirmed yet".into()));
    }

    let follow =
      follow_session::ActiveModel { presence: Set(presence), ..follow.into() }
        .update(self.db)
        .await?;
    Ok(follow)
  }

  pub async fn readers_in_session(
    &self,
    session_id: i32,
  ) -> Result<Vec<user::Model>> {
    let ids: Vec<i32> = follow_session::Entity::find()
      .filter(follow_session::Column::SessionId.eq(session_id))
      .filter(follow_session::Column::Approved.eq(true))
      .all(self.db)
      .await?
      .into_iter()
      .map(|f| f.user_id)
      .collect();
    self.users_ordered(ids).await
  }

  pub async fn dashboard(&self, user_id: i32) -> Result<Dashboard> {
    let follows: HashMap<i32, bool> = follow_session::Entity::find()
      .filter(follow_session::Column::UserId.eq(user_id))
      .all(self.db)
      .await?
      .into_iter()
      .map(|f| (f.session_id, f.approved))
      .collect();

    let sessions = session::Entity::find()
      .filter(session::Column::Id.is_in(follows.keys().copied()))
      .filter(session::Column::StartDate.gt(utils::now()))
      .order_by_asc(session::Column::StartDate)
      .all(self.db)
      .await?;

    let (approved, pending): (Vec<_>, Vec<_>) = sessions
      .into_iter()
      .partition(|s| follows.get(&s.id).copied().unwrap_or(false));

    let sv = sv::Session::new(self.db);
    Ok(Dashboard {
      pending: sv.views(pending).await?,
      confirmed: sv.views(approved).await?,
    })
  }

  pub async fn unlocked_books(&self, user_id: i32) -> Result<Vec<book::Model>> {
    let ids: HashSet<i32> = follow_book::Entity::find()
      .filter(follow_book::Column::UserId.eq(user_id))
      .all(self.db)
      .await?
      .into_iter()
      .map(|f| f.book_id)
      .collect();

    let books = book::Entity::find()
      .filter(book::Column::Id.is_in(ids))
      .order_by_asc(book::Column::Title)
      .all(self.db)
      .await?;
    Ok(books)
  }

  async fn users(
    &self,
    ids: impl Iterator<Item = i32>,
  ) -> Result<HashMap<i32, user::Model>> {
    let users = user::Entity::find()
      .filter(user::Column::Id.is_in(ids))
      .all(self.db)
      .await?
      .into_iter()
      .map(|u| (u.id, u))
      .collect();
    Ok(users)
  }

  async fn users_ordered(&self, ids: Vec<i32>) -> Result<Vec<user::Model>> {
    let users = user::Entity::find()
      .filter(user::Column::Id.is_in(ids))
      .order_by_asc(user::Column::Username)
      .all(self.db)
      .await?;
    Ok(users)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::{fixtures, test_db};

  async fn entitled(db: &DatabaseConnection, name: &str, pack_id: i32) -> i32 {
    let reader = fixtures::reader(db, name).await;
    let sv = Follow::new(db);
    sv.request_pack(reader.id, pack_id).await.unwrap();
    sv.set_pack_approval(reader.id, pack_id, true).await.unwrap();
    reader.id
  }

  #[tokio::test]
  async fn test_enroll_requires_approved_pack() {
    let db = test_db::setup().await;
    let session = fixtures::session(&db, "Club", 5).await;
    let reader = fixtures::reader(&db, "alice").await;
    let sv = Follow::new(&db);

    let res = sv.enroll(reader.id, session.id).await;
    assert!(matches!(res, Err(Error::Enroll(Enroll::PackNotApproved))));

    let (_, created) = sv.request_pack(reader.id, session.pack_id).await.unwrap();
    assert!(created);
    let (_, created) = sv.request_pack(reader.id, session.pack_id).await.unwrap();
    assert!(!created);

    let res = sv.enroll(reader.id, session.id).await;
    assert!(matches!(res, Err(Error::Enroll(Enroll::PackNotApproved))));

    sv.set_pack_approval(reader.id, session.pack_id, true).await.unwrap();
    let follow = sv.enroll(reader.id, session.id).await.unwrap();
    assert!(follow.approved);
    assert!(!follow.presence);

    let books = sv.unlocked_books(reader.id).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, session.book_id);
  }

  #[tokio::test]
  async fn test_enroll_capacity() {
    let db = test_db::setup().await;
    let session = fixtures::session(&db, "Tiny", 2).await;
    let sv = Follow::new(&db);

    let a = entitled(&db, "a", session.pack_id).await;
    let b = entitled(&db, "b", session.pack_id).await;
    let c = entitled(&db, "c", session.pack_id).await;

    sv.enroll(a, session.id).await.unwrap();
    assert!(matches!(
      sv.enroll(a, session.id).await,
      Err(Error::Enroll(Enroll::Already))
    ));
    sv.enroll(b, session.id).await.unwrap();
    assert!(matches!(
      sv.enroll(c, session.id).await,
      Err(Error::Enroll(Enroll::Full))
    ));
    assert_eq!(confirmed(&db, session.id).await.unwrap(), 2);

    sv.cancel(b, session.id).await.unwrap();
    sv.enroll(c, session.id).await.unwrap();

    let readers = sv.readers_in_session(session.id).await.unwrap();
    let names: Vec<_> = readers.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["a", "c"]);
  }

  #[tokio::test]
  async fn test_enroll_unknown_session() {
    let db = test_db::setup().await;
    let reader = fixtures::reader(&db, "alice").await;

    let res = Follow::new(&db).enroll(reader.id, 404).await;
    assert!(matches!(res, Err(Error::SessionNotFound)));
  }

  #[tokio::test]
  async fn test_admin_approval_respects_capacity() {
    let db = test_db::setup().await;
    let session = fixtures::session(&db, "Solo", 1).await;
    let sv = Follow::new(&db);

    let a = entitled(&db, "a", session.pack_id).await;
    let b = entitled(&db, "b", session.pack_id).await;
    sv.enroll(a, session.id).await.unwrap();

    follow_session::ActiveModel {
      user_id: Set(b),
      session_id: Set(session.id),
      approved: Set(false),
      presence: Set(false),
    }
    .insert(&db)
    .await
    .unwrap();

    let res = sv.set_session_approval(b, session.id, true).await;
    assert!(matches!(res, Err(Error::Enroll(Enroll::Full))));

    sv.set_session_approval(a, session.id, false).await.unwrap();
    sv.set_session_approval(b, session.id, true).await.unwrap();
    assert_eq!(confirmed(&db, session.id).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_reapproval_after_losing_pack() {
    let db = test_db::setup().await;
    let session = fixtures::session(&db, "Club", 5).await;
    let sv = Follow::new(&db);
    let a = entitled(&db, "a", session.pack_id).await;

    sv.enroll(a, session.id).await.unwrap();
    sv.set_session_approval(a, session.id, false).await.unwrap();
    sv.unfollow_pack(a, session.pack_id).await.unwrap();

    let res = sv.set_session_approval(a, session.id, true).await;
    assert!(matches!(res, Err(Error::Enroll(Enroll::PackNotApproved))));
    assert_eq!(confirmed(&db, session.id).await.unwrap(), 0);

    sv.request_pack(a, session.pack_id).await.unwrap();
    let res = sv.set_session_approval(a, session.id, true).await;
    assert!(matches!(res, Err(Error::Enroll(Enroll::PackNotApproved))));

    sv.set_pack_approval(a, session.pack_id, true).await.unwrap();
    let follow = sv.set_session_approval(a, session.id, true).await.unwrap();
    assert!(follow.approved);
  }

  #[tokio::test]
  async fn test_presence_and_dashboard() {
    let db = test_db::setup().await;
    let session = fixtures::session(&db, "Evening", 3).await;
    let sv = Follow::new(&db);
    let a = entitled(&db, "a", session.pack_id).await;

    assert!(matches!(
      sv.set_presence(a, session.id, true).await,
      Err(Error::FollowNotFound)
    ));
    sv.enroll(a, session.id).await.unwrap();
    let follow = sv.set_presence(a, session.id, true).await.unwrap();
    assert!(follow.presence);

    let dashboard = sv.dashboard(a).await.unwrap();
    assert!(dashboard.pending.is_empty());
    assert_eq!(dashboard.confirmed.len(), 1);
    assert_eq!(dashboard.confirmed[0].session.id, session.id);

    let packs = sv.followed_packs(a).await.unwrap();
    assert!(packs[0].approved);
    assert_eq!(sv.readers_in_pack(session.pack_id).await.unwrap().len(), 1);

    let views = sv.pack_follows(Some(session.pack_id)).await.unwrap();
    assert_eq!(views[0].username.as_deref(), Some("a"));
  }
}
