use json::Value;
use serde::Deserialize;

use crate::{
  entity::{
    about_book, book, book_pack, follow_book, follow_session, pack, session,
  },
  prelude::*,
  sv,
};

#[derive(Debug, Default, Deserialize)]
pub struct BookInput {
  pub title: Option<String>,
  pub author: Option<String>,
  pub description: Option<String>,
  pub img: Option<String>,
  pub release_date: Option<Date>,
  pub page_number: Option<i32>,
  pub category: Option<String>,
}

pub struct Book<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Book<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn ensure_unique(
    &self,
    title: &str,
    author: &str,
    except: Option<i32>,
  ) -> Result<()> {
    let mut query = book::Entity::find()
      .filter(book::Column::Title.eq(title))
      .filter(book::Column::Author.eq(author));
    if let Some(id) = except {
      query = query.filter(book::Column::Id.ne(id));
    }

    if query.one(self.db).await?.is_some() {
      return Err(Error::Conflict(
        "A book with this title and author already exists".into(),
      ));
    }
    Ok(())
  }

  pub async fn create(&self, input: BookInput) -> Result<book::Model> {
    let title = utils::required("title", input.title.as_deref())?;
    let author = utils::required("author", input.author.as_deref())?;
    if input.page_number.is_some_and(|n| n <= 0) {
      return Err(Error::InvalidArgs("Page number must be positive".into()));
    }

    self.ensure_unique(title, author, None).await?;

    let book = book::ActiveModel {
      title: Set(title.to_string()),
      author: Set(author.to_string()),
      description: Set(input.description),
      img: Set(input.img),
      release_date: Set(input.release_date),
      page_number: Set(input.page_number),
      category: Set(input.category),
      created_at: Set(utils::now()),
      ..Default::default()
    };

    Ok(book.insert(self.db).await?)
  }

  pub async fn update(&self, id: i32, input: BookInput) -> Result<book::Model> {
    let book = self.get(id).await?;

    let title = match input.title.as_deref() {
      Some(title) => utils::required("title", Some(title))?.to_string(),
      None => book.title.clone(),
    };
    let author = match input.author.as_deref() {
      Some(author) => utils::required("author", Some(author))?.to_string(),
      None => book.author.clone(),
    };
    if title != book.title || author != book.author {
      self.ensure_unique(&title, &author, Some(id)).await?;
    }

    let mut active: book::ActiveModel = book.into();
    active.title = Set(title);
    active.author = Set(author);
    if let Some(description) = input.description {
      active.description = Set(Some(description));
    }
    if let Some(img) = input.img {
      active.img = Set(Some(img));
    }
    if let Some(date) = input.release_date {
      active.release_date = Set(Some(date));
    }
    if let Some(pages) = input.page_number {
      active.page_number = Set(Some(pages));
    }
    if let Some(category) = input.category {
      active.category = Set(Some(category));
    }

    Ok(active.update(self.db).await?)
  }

  pub async fn get(&self, id: i32) -> Result<book::Model> {
    book::Entity::find_by_id(id).one(self.db).await?.ok_or(Error::BookNotFound)
  }

  pub async fn all(&self) -> Result<Vec<book::Model>> {
    let books = book::Entity::find()
      .order_by_asc(book::Column::Title)
      .all(self.db)
      .await?;
    Ok(books)
  }

  /// Book with its sessions that have not started yet.
  pub async fn with_upcoming(
    &self,
    id: i32,
  ) -> Result<(book::Model, Vec<session::Model>)> {
    let book = self.get(id).await?;
    let sessions = session::Entity::find()
      .filter(session::Column::BookId.eq(id))
      .filter(session::Column::StartDate.gt(utils::now()))
      .order_by_asc(session::Column::StartDate)
      .all(self.db)
      .await?;
    Ok((book, sessions))
  }

  pub async fn about(&self, book_id: i32) -> Result<about_book::Model> {
    about_book::Entity::find()
      .filter(about_book::Column::BookId.eq(book_id))
      .one(self.db)
      .await?
      .ok_or(Error::AboutNotFound)
  }

  pub async fn create_about(
    &self,
    book_id: i32,
    about: Value,
  ) -> Result<about_book::Model> {
    if about.is_null() {
      return Err(Error::InvalidArgs("Book details are required".into()));
    }
    self.get(book_id).await?;

    let existing = about_book::Entity::find()
      .filter(about_book::Column::BookId.eq(book_id))
      .one(self.db)
      .await?;
    if existing.is_some() {
      return Err(Error::Conflict(
        "Details for this book already exist".into(),
      ));
    }

    let about = about_book::ActiveModel {
      book_id: Set(book_id),
      about: Set(about),
      updated_at: Set(utils::now()),
      ..Default::default()
    };
    Ok(about.insert(self.db).await?)
  }

  pub async fn update_about(
    &self,
    book_id: i32,
    about: Value,
  ) -> Result<about_book::Model> {
    if about.is_null() {
      return Err(Error::InvalidArgs("Book details are required".into()));
    }
    let current = self.about(book_id).await?;

    let about = about_book::ActiveModel {
      about: Set(about),
      updated_at: Set(utils::now()),
      ..current.into()
    };
    Ok(about.update(self.db).await?)
  }

  pub async fn delete_about(&self, book_id: i32) -> Result<()> {
    let res = about_book::Entity::delete_many()
      .filter(about_book::Column::BookId.eq(book_id))
      .exec(self.db)
      .await?;
    if res.rows_affected == 0 {
      return Err(Error::AboutNotFound);
    }
    Ok(())
  }

  /// Books of the category the user followed the most sessions in.
  /// Ties go to the alphabetically first category.
  pub async fn suggest_for(
    &self,
    user_id: i32,
  ) -> Result<(String, Vec<book::Model>)> {
    sv::User::new(self.db).get(user_id).await?;

    let sessions: Vec<i32> = follow_session::Entity::find()
      .filter(follow_session::Column::UserId.eq(user_id))
      .all(self.db)
      .await?
      .into_iter()
      .map(|f| f.session_id)
      .collect();
    let book_ids: Vec<i32> = session::Entity::find()
      .filter(session::Column::Id.is_in(sessions))
      .all(self.db)
      .await?
      .into_iter()
      .map(|s| s.book_id)
      .collect();

    let categories: HashMap<i32, String> = book::Entity::find()
      .filter(book::Column::Id.is_in(book_ids.iter().copied()))
      .all(self.db)
      .await?
      .into_iter()
      .filter_map(|b| b.category.map(|c| (b.id, c)))
      .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in &book_ids {
      if let Some(category) = categories.get(id) {
        *counts.entry(category.as_str()).or_default() += 1;
      }
    }
    let Some((category, _)) = counts
      .into_iter()
      .max_by(|(a, x), (b, y)| x.cmp(y).then_with(|| b.cmp(a)))
    else {
      return Err(Error::NoSuggestion);
    };
    let category = category.to_string();

    let books = book::Entity::find()
      .filter(book::Column::Category.eq(category.as_str()))
      .order_by_asc(book::Column::Title)
      .all(self.db)
      .await?;
    Ok((category, books))
  }

  /// Removes the book from every pack, drops unlocks and its sessions.
  pub async fn delete(&self, id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    book::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::BookNotFound)?;

    let links = book_pack::Entity::find()
      .filter(book_pack::Column::BookId.eq(id))
      .all(&txn)
      .await?;
    for link in links {
      if let Some(pack) = pack::Entity::find_by_id(link.pack_id).one(&txn).await?
      {
        let count = pack.book_number;
        pack::ActiveModel {
          book_number: Set((count - 1).max(0)),
          ..pack.into()
        }
        .update(&txn)
        .await?;
      }
    }
    book_pack::Entity::delete_many()
      .filter(book_pack::Column::BookId.eq(id))
      .exec(&txn)
      .await?;

    follow_book::Entity::delete_many()
      .filter(follow_book::Column::BookId.eq(id))
      .exec(&txn)
      .await?;

    let sessions: Vec<i32> = session::Entity::find()
      .filter(session::Column::BookId.eq(id))
      .all(&txn)
      .await?
      .into_iter()
      .map(|s| s.id)
      .collect();
    sv::session::purge(&txn, sessions).await?;

    about_book::Entity::delete_many()
      .filter(about_book::Column::BookId.eq(id))
      .exec(&txn)
      .await?;
    book::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    info!("Deleted book #{id}");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::{fixtures, test_db};

  #[tokio::test]
  async fn test_title_author_unique() {
    let db = test_db::setup().await;
    let sv = Book::new(&db);

    fixtures::book(&db, "Dune").await;

    let dup = sv
      .create(BookInput {
        title: Some("Dune".into()),
        author: Some("Frank Herbert".into()),
        ..Default::default()
      })
      .await;
    assert!(matches!(dup, Err(Error::Conflict(_))));

    let other_author = sv
      .create(BookInput {
        title: Some("Dune".into()),
        author: Some("Someone Else".into()),
        ..Default::default()
      })
      .await;
    assert!(other_author.is_ok());
  }

  #[tokio::test]
  async fn test_missing_author() {
    let db = test_db::setup().await;

    let res = Book::new(&db)
      .create(BookInput { title: Some("Emma".into()), ..Default::default() })
      .await;

    assert!(matches!(res, Err(Error::InvalidArgs(msg)) if msg == "Author is required"));
  }

  #[tokio::test]
  async fn test_delete_unlinks_packs() {
    let db = test_db::setup().await;
    let session = fixtures::session(&db, "Reading night", 3).await;

    let pack = sv::Pack::new(&db).get(session.pack_id).await.unwrap();
    assert_eq!(pack.book_number, 1);

    Book::new(&db).delete(session.book_id).await.unwrap();

    let pack = sv::Pack::new(&db).get(session.pack_id).await.unwrap();
    assert_eq!(pack.book_number, 0);
    assert!(matches!(
      sv::Session::new(&db).get(session.id).await,
      Err(Error::SessionNotFound)
    ));
  }

  #[tokio::test]
  async fn test_about_lifecycle() {
    let db = test_db::setup().await;
    let book = fixtures::book(&db, "Dune").await;
    let sv = Book::new(&db);

    assert!(matches!(sv.about(book.id).await, Err(Error::AboutNotFound)));
    assert!(matches!(
      sv.create_about(404, json::json!({ "themes": [] })).await,
      Err(Error::BookNotFound)
    ));
    assert!(matches!(
      sv.create_about(book.id, Value::Null).await,
      Err(Error::InvalidArgs(_))
    ));

    let about = json::json!({ "themes": ["ecology", "power"] });
    sv.create_about(book.id, about.clone()).await.unwrap();
    assert!(matches!(
      sv.create_about(book.id, about).await,
      Err(Error::Conflict(_))
    ));

    let updated = sv
      .update_about(book.id, json::json!({ "themes": ["desert"] }))
      .await
      .unwrap();
    assert_eq!(updated.about["themes"][0], "desert");
    assert_eq!(sv.about(book.id).await.unwrap().id, updated.id);

    sv.delete_about(book.id).await.unwrap();
    assert!(matches!(sv.delete_about(book.id).await, Err(Error::AboutNotFound)));

    sv.create_about(book.id, json::json!({})).await.unwrap();
    sv.delete(book.id).await.unwrap();
    assert!(matches!(sv.about(book.id).await, Err(Error::AboutNotFound)));
  }

  #[tokio::test]
  async fn test_suggest_most_followed_category() {
    let db = test_db::setup().await;
    let sv = Book::new(&db);
    let reader = fixtures::reader(&db, "alice").await;

    assert!(matches!(sv.suggest_for(reader.id).await, Err(Error::NoSuggestion)));
    assert!(matches!(sv.suggest_for(404).await, Err(Error::UserNotFound)));

    for (name, category) in
      [("Alpha", "fantasy"), ("Beta", "fantasy"), ("Gamma", "poetry")]
    {
      let session = fixtures::session(&db, name, 5).await;
      let input =
        BookInput { category: Some(category.into()), ..Default::default() };
      sv.update(session.book_id, input).await.unwrap();
      follow_session::ActiveModel {
        user_id: Set(reader.id),
        session_id: Set(session.id),
        approved: Set(false),
        presence: Set(false),
      }
      .insert(&db)
      .await
      .unwrap();
    }
    sv.create(BookInput {
      title: Some("Hobbit".into()),
      author: Some("J. R. R. Tolkien".into()),
      category: Some("fantasy".into()),
      ..Default::default()
    })
    .await
    .unwrap();

    let (category, books) = sv.suggest_for(reader.id).await.unwrap();
    assert_eq!(category, "fantasy");
    let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["Alpha book", "Beta book", "Hobbit"]);
  }
}
