use serde::{Deserialize, Serialize};

use crate::{
  entity::{
    Location, UserRole, book, follow_session, pack, session, session_quiz, user,
  },
  prelude::*,
};

const DEFAULT_CAPACITY: i32 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct SessionInput {
  pub name: Option<String>,
  pub description: Option<String>,
  pub img: Option<String>,
  pub capacity: Option<i32>,
  pub book_id: Option<i32>,
  pub teacher_id: Option<i32>,
  pub pack_id: Option<i32>,
  pub location: Option<Location>,
  pub start_date: Option<DateTime>,
  pub end_date: Option<DateTime>,
  pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
  #[serde(flatten)]
  pub session: session::Model,
  pub book_name: Option<String>,
  pub teacher_name: Option<String>,
  /// Approved follows only.
  pub enrolled: u64,
}

/// Removes sessions with their follows and quizzes.
pub(crate) async fn purge<C: ConnectionTrait>(
  conn: &C,
  ids: Vec<i32>,
) -> Result<()> {
  if ids.is_empty() {
    return Ok(());
  }

  follow_session::Entity::delete_many()
    .filter(follow_session::Column::SessionId.is_in(ids.clone()))
    .exec(conn)
    .await?;
  session_quiz::Entity::delete_many()
    .filter(session_quiz::Column::SessionId.is_in(ids.clone()))
    .exec(conn)
    .await?;
  session::Entity::delete_many()
    .filter(session::Column::Id.is_in(ids))
    .exec(conn)
    .await?;
  Ok(())
}

pub struct Session<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Session<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn ensure_name_free(&self, name: &str) -> Result<()> {
    let taken = session::Entity::find()
      .filter(session::Column::Name.eq(name))
      .one(self.db)
      .await?;
    if taken.is_some() {
      return Err(Error::Conflict("Session name already exists".into()));
    }
    Ok(())
  }

  async fn check_refs(
    &self,
    book_id: Option<i32>,
    teacher_id: Option<i32>,
    pack_id: Option<i32>,
  ) -> Result<()> {
    if let Some(id) = book_id {
      book::Entity::find_by_id(id)
        .one(self.db)
        .await?
        .ok_or(Error::BookNotFound)?;
    }
    if let Some(id) = teacher_id {
      let teacher = user::Entity::find_by_id(id)
        .one(self.db)
        .await?
        .ok_or(Error::UserNotFound)?;
      if teacher.role != UserRole::Teacher {
        return Err(Error::InvalidArgs("Assigned user is not a teacher".into()));
      }
    }
    if let Some(id) = pack_id {
      pack::Entity::find_by_id(id)
        .one(self.db)
        .await?
        .ok_or(Error::PackNotFound)?;
    }
    Ok(())
  }

  pub async fn create(&self, input: SessionInput) -> Result<session::Model> {
    let name = utils::required("name", input.name.as_deref())?;
    let (Some(start), Some(end)) = (input.start_date, input.end_date) else {
      return Err(Error::InvalidArgs("Start and end dates are required".into()));
    };
    if end < start {
      return Err(Error::InvalidArgs("Session ends before it starts".into()));
    }
    let capacity = input.capacity.unwrap_or(DEFAULT_CAPACITY);
    if capacity <= 0 {
      return Err(Error::InvalidArgs("Capacity must be positive".into()));
    }
    let (Some(book_id), Some(teacher_id), Some(pack_id)) =
      (input.book_id, input.teacher_id, input.pack_id)
    else {
      return Err(Error::InvalidArgs(
        "Book, teacher and pack are required".into(),
      ));
    };

    self.ensure_name_free(name).await?;
    self.check_refs(Some(book_id), Some(teacher_id), Some(pack_id)).await?;

    let session = session::ActiveModel {
      name: Set(name.to_string()),
      description: Set(input.description),
      img: Set(input.img),
      capacity: Set(capacity),
      book_id: Set(book_id),
      teacher_id: Set(teacher_id),
      pack_id: Set(pack_id),
      location: Set(input.location.unwrap_or_default()),
      start_date: Set(start),
      end_date: Set(end),
      active: Set(input.active.unwrap_or(true)),
      ..Default::default()
    };

    let session = session.insert(self.db).await?;
    info!("Created session #{} `{}`", session.id, session.name);
    Ok(session)
  }

  pub async fn update(
    &self,
    id: i32,
    input: SessionInput,
  ) -> Result<session::Model> {
    let session = self.get(id).await?;
    self.check_refs(input.book_id, input.teacher_id, input.pack_id).await?;

    let start = input.start_date.unwrap_or(session.start_date);
    let end = input.end_date.unwrap_or(session.end_date);
    if end < start {
      return Err(Error::InvalidArgs("Session ends before it starts".into()));
    }

    let mut active: session::ActiveModel = session.clone().into();

    if let Some(name) = input.name.as_deref() {
      let name = utils::required("name", Some(name))?;
      if name != session.name {
        self.ensure_name_free(name).await?;
      }
      active.name = Set(name.to_string());
    }
    if let Some(capacity) = input.capacity {
      if capacity <= 0 {
        return Err(Error::InvalidArgs("Capacity must be positive".into()));
      }
      active.capacity = Set(capacity);
    }
    if let Some(description) = input.description {
      active.description = Set(Some(description));
    }
    if let Some(img) = input.img {
      active.img = Set(Some(img));
    }
    if let Some(book_id) = input.book_id {
      active.book_id = Set(book_id);
    }
    if let Some(teacher_id) = input.teacher_id {
      active.teacher_id = Set(teacher_id);
    }
    if let Some(pack_id) = input.pack_id {
      active.pack_id = Set(pack_id);
    }
    if let Some(location) = input.location {
      active.location = Set(location);
    }
    if let Some(flag) = input.active {
      active.active = Set(flag);
    }
    active.start_date = Set(start);
    active.end_date = Set(end);

    Ok(active.update(self.db).await?)
  }

  pub async fn get(&self, id: i32) -> Result<session::Model> {
    session::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::SessionNotFound)
  }

  pub async fn view(&self, id: i32) -> Result<SessionView> {
    let session = self.get(id).await?;
    let mut views = self.views(vec![session]).await?;
    views.pop().ok_or(Error::SessionNotFound)
  }

  /// Attaches book title, teacher name and enrollment count.
  pub async fn views(
    &self,
    sessions: Vec<session::Model>,
  ) -> Result<Vec<SessionView>> {
    let ids: Vec<i32> = sessions.iter().map(|s| s.id).collect();
    let book_ids: HashSet<i32> = sessions.iter().map(|s| s.book_id).collect();
    let teacher_ids: HashSet<i32> =
      sessions.iter().map(|s| s.teacher_id).collect();

    let books: HashMap<i32, String> = book::Entity::find()
      .filter(book::Column::Id.is_in(book_ids))
      .all(self.db)
      .await?
      .into_iter()
      .map(|b| (b.id, b.title))
      .collect();
    let teachers: HashMap<i32, String> = user::Entity::find()
      .filter(user::Column::Id.is_in(teacher_ids))
      .all(self.db)
      .await?
      .into_iter()
      .map(|u| (u.id, u.username))
      .collect();

    let mut enrolled: HashMap<i32, u64> = HashMap::new();
    for follow in follow_session::Entity::find()
      .filter(follow_session::Column::SessionId.is_in(ids))
      .filter(follow_session::Column::Approved.eq(true))
      .all(self.db)
      .await?
    {
      *enrolled.entry(follow.session_id).or_default() += 1;
    }

    let views = sessions
      .into_iter()
      .map(|session| SessionView {
        book_name: books.get(&session.book_id).cloned(),
        teacher_name: teachers.get(&session.teacher_id).cloned(),
        enrolled: enrolled.get(&session.id).copied().unwrap_or(0),
        session,
      })
      .collect();
    Ok(views)
  }

  pub async fn all(&self) -> Result<Vec<SessionView>> {
    let sessions = session::Entity::find()
      .order_by_asc(session::Column::StartDate)
      .all(self.db)
      .await?;
    self.views(sessions).await
  }

  pub async fn by_teacher(&self, teacher_id: i32) -> Result<Vec<SessionView>> {
    let sessions = session::Entity::find()
      .filter(session::Column::TeacherId.eq(teacher_id))
      .order_by_asc(session::Column::StartDate)
      .all(self.db)
      .await?;
    self.views(sessions).await
  }

  pub async fn by_book(&self, book_id: i32) -> Result<Vec<SessionView>> {
    let sessions = session::Entity::find()
      .filter(session::Column::BookId.eq(book_id))
      .order_by_asc(session::Column::StartDate)
      .all(self.db)
      .await?;
    self.views(sessions).await
  }

  pub async fn delete(&self, id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    session::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::SessionNotFound)?;
    purge(&txn, vec![id]).await?;

    txn.commit().await?;
    info!("Deleted session #{id}");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::{
    self,
    test_utils::{fixtures, test_db},
  };

  #[tokio::test]
  async fn test_create_checks_teacher_and_dates() {
    let db = test_db::setup().await;
    let base = fixtures::session(&db, "Base", 10).await;
    let reader = fixtures::reader(&db, "bob").await;
    let sv = Session::new(&db);

    let start = utils::now();
    let input = |teacher_id, end| SessionInput {
      name: Some("Second".into()),
      book_id: Some(base.book_id),
      pack_id: Some(base.pack_id),
      teacher_id: Some(teacher_id),
      start_date: Some(start),
      end_date: Some(end),
      ..Default::default()
    };

    let res = sv.create(input(reader.id, start)).await;
    assert!(matches!(res, Err(Error::InvalidArgs(_))));

    let earlier = start - chrono::TimeDelta::hours(1);
    let res = sv.create(input(base.teacher_id, earlier)).await;
    assert!(matches!(res, Err(Error::InvalidArgs(_))));

    let created = sv.create(input(base.teacher_id, start)).await.unwrap();
    assert_eq!(created.capacity, DEFAULT_CAPACITY);
    assert_eq!(created.location, Location::Online);

    let dup = sv.create(input(base.teacher_id, start)).await;
    assert!(matches!(dup, Err(Error::Conflict(_))));
  }

  #[tokio::test]
  async fn test_views_count_approved_only() {
    let db = test_db::setup().await;
    let session = fixtures::session(&db, "Poetry", 4).await;
    let follow = sv::Follow::new(&db);

    let alice = fixtures::reader(&db, "alice").await;
    follow.request_pack(alice.id, session.pack_id).await.unwrap();
    follow.set_pack_approval(alice.id, session.pack_id, true).await.unwrap();
    follow.enroll(alice.id, session.id).await.unwrap();

    let view = Session::new(&db).view(session.id).await.unwrap();
    assert_eq!(view.enrolled, 1);
    assert_eq!(view.book_name.as_deref(), Some("Poetry book"));
    assert_eq!(view.teacher_name.as_deref(), Some("Poetry-teacher"));

    let by_teacher =
      Session::new(&db).by_teacher(session.teacher_id).await.unwrap();
    assert_eq!(by_teacher.len(), 1);
  }

  #[tokio::test]
  async fn test_delete_removes_follows() {
    let db = test_db::setup().await;
    let session = fixtures::session(&db, "Drama", 4).await;
    let alice = fixtures::reader(&db, "alice").await;

    let follow = sv::Follow::new(&db);
    follow.request_pack(alice.id, session.pack_id).await.unwrap();
    follow.set_pack_approval(alice.id, session.pack_id, true).await.unwrap();
    follow.enroll(alice.id, session.id).await.unwrap();

    Session::new(&db).delete(session.id).await.unwrap();

    let left = follow_session::Entity::find().count(&db).await.unwrap();
    assert_eq!(left, 0);
    assert!(matches!(
      Session::new(&db).delete(session.id).await,
      Err(Error::SessionNotFound)
    ));
  }
}
