//! In-memory database and fixtures shared by service tests

pub mod test_db {
  use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbBackend, EntityTrait,
    Schema,
  };

  use crate::entity::*;

  async fn create<E: EntityTrait>(db: &DatabaseConnection, entity: E) {
    let schema = Schema::new(DbBackend::Sqlite);
    let stmt = schema.create_table_from_entity(entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();
  }

  /// Creates an in-memory SQLite database with every table, parents first
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();

    create(&db, user::Entity).await;
    create(&db, teacher_postulate::Entity).await;
    create(&db, book::Entity).await;
    create(&db, pack::Entity).await;
    create(&db, book_pack::Entity).await;
    create(&db, session::Entity).await;
    create(&db, session_quiz::Entity).await;
    create(&db, follow_pack::Entity).await;
    create(&db, follow_session::Entity).await;
    create(&db, follow_book::Entity).await;
    create(&db, code::Entity).await;
    create(&db, about_book::Entity).await;
    create(&db, notification::Entity).await;

    db
  }
}

pub mod fixtures {
  use sea_orm::DatabaseConnection;

  use crate::{
    entity::{UserRole, book, pack, session, user},
    sv,
  };

  pub async fn user(
    db: &DatabaseConnection,
    name: &str,
    role: UserRole,
  ) -> user::Model {
    sv::User::new(db)
      .create(sv::user::NewUser {
        username: name.into(),
        email: format!("{name}@iread.test"),
        password: "secret".into(),
        img: None,
        role,
        description: Some("Teaches things".into()),
        study_level: Some("Master".into()),
        level: None,
      })
      .await
      .unwrap()
  }

  pub async fn reader(db: &DatabaseConnection, name: &str) -> user::Model {
    user(db, name, UserRole::Reader).await
  }

  pub async fn book(db: &DatabaseConnection, title: &str) -> book::Model {
    sv::Book::new(db)
      .create(sv::book::BookInput {
        title: Some(title.into()),
        author: Some("Frank Herbert".into()),
        ..Default::default()
      })
      .await
      .unwrap()
  }

  pub async fn pack(db: &DatabaseConnection, title: &str) -> pack::Model {
    sv::Pack::new(db)
      .create(sv::pack::PackInput {
        title: Some(title.into()),
        level: Some("B1".into()),
        ..Default::default()
      })
      .await
      .unwrap()
  }

  /// A future session of `capacity` seats with its own book, pack and teacher.
  pub async fn session(
    db: &DatabaseConnection,
    name: &str,
    capacity: i32,
  ) -> session::Model {
    let book = book(db, &format!("{name} book")).await;
    let pack = pack(db, &format!("{name} pack")).await;
    let teacher =
      user(db, &format!("{name}-teacher"), UserRole::Teacher).await;

    sv::Pack::new(db).add_book(pack.id, book.id).await.unwrap();

    let start = crate::utils::now() + chrono::TimeDelta::days(7);
    sv::Session::new(db)
      .create(sv::session::SessionInput {
        name: Some(name.into()),
        capacity: Some(capacity),
        book_id: Some(book.id),
        teacher_id: Some(teacher.id),
        pack_id: Some(pack.id),
        start_date: Some(start),
        end_date: Some(start + chrono::TimeDelta::hours(2)),
        ..Default::default()
      })
      .await
      .unwrap()
  }
}
