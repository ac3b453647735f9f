use sea_orm::sea_query::{Expr, Func};
use serde::Deserialize;

use crate::{
  entity::{
    AgeGroup, book, book_pack, code, follow_book, follow_pack, pack, session,
  },
  prelude::*,
  sv,
};

#[derive(Debug, Default, Deserialize)]
pub struct PackInput {
  pub title: Option<String>,
  pub level: Option<String>,
  pub description: Option<String>,
  pub img: Option<String>,
  pub age: Option<AgeGroup>,
  pub faq: Option<String>,
  pub duration: Option<i32>,
  pub price: Option<f64>,
  pub discount: Option<f64>,
  pub public: Option<bool>,
}

impl PackInput {
  fn check(&self) -> Result<()> {
    if self.price.is_some_and(|p| p < 0.0) {
      return Err(Error::InvalidArgs("Price must not be negative".into()));
    }
    if self.discount.is_some_and(|d| !(0.0..=100.0).contains(&d)) {
      return Err(Error::InvalidArgs(
        "Discount must be between 0 and 100".into(),
      ));
    }
    if self.duration.is_some_and(|d| d <= 0) {
      return Err(Error::InvalidArgs("Duration must be positive".into()));
    }
    Ok(())
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct PackFilter {
  pub age: Option<AgeGroup>,
  pub title: Option<String>,
}

pub struct Pack<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Pack<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn ensure_title_free(&self, title: &str) -> Result<()> {
    let taken = pack::Entity::find()
      .filter(pack::Column::Title.eq(title))
      .one(self.db)
      .await?;
    if taken.is_some() {
      return Err(Error::Conflict("Pack title already exists".into()));
    }
    Ok(())
  }

  pub async fn create(&self, input: PackInput) -> Result<pack::Model> {
    let title = utils::required("title", input.title.as_deref())?;
    let level = utils::required("level", input.level.as_deref())?;
    input.check()?;

    self.ensure_title_free(title).await?;

    let pack = pack::ActiveModel {
      title: Set(title.to_string()),
      level: Set(level.to_string()),
      description: Set(input.description),
      age: Set(input.age),
      img: Set(input.img),
      faq: Set(input.faq),
      duration: Set(input.duration),
      book_number: Set(0),
      price: Set(input.price.unwrap_or(0.0)),
      discount: Set(input.discount.unwrap_or(0.0)),
      public: Set(input.public.unwrap_or(true)),
      invoice_product_id: Set(None),
      created_at: Set(utils::now()),
      ..Default::default()
    };

    let pack = pack.insert(self.db).await?;
    info!("Created pack #{} `{}`", pack.id, pack.title);
    Ok(pack)
  }

  pub async fn update(&self, id: i32, input: PackInput) -> Result<pack::Model> {
    let pack = self.get(id).await?;
    input.check()?;

    let mut active: pack::ActiveModel = pack.clone().into();

    if let Some(title) = input.title.as_deref() {
      let title = utils::required("title", Some(title))?;
      if title != pack.title {
        self.ensure_title_free(title).await?;
      }
      active.title = Set(title.to_string());
    }
    if let Some(level) = input.level.as_deref() {
      active.level = Set(utils::required("level", Some(level))?.to_string());
    }
    if let Some(description) = input.description {
      active.description = Set(Some(description));
    }
    if let Some(age) = input.age {
      active.age = Set(Some(age));
    }
    if let Some(img) = input.img {
      active.img = Set(Some(img));
    }
    if let Some(faq) = input.faq {
      active.faq = Set(Some(faq));
    }
    if let Some(duration) = input.duration {
      active.duration = Set(Some(duration));
    }
    if let Some(price) = input.price {
      active.price = Set(price);
    }
    if let Some(discount) = input.discount {
      active.discount = Set(discount);
    }
    if let Some(public) = input.public {
      active.public = Set(public);
    }

    Ok(active.update(self.db).await?)
  }

  pub async fn get(&self, id: i32) -> Result<pack::Model> {
    pack::Entity::find_by_id(id).one(self.db).await?.ok_or(Error::PackNotFound)
  }

  /// All packs, optionally narrowed by age group and a case-insensitive
  /// title fragment.
  pub async fn list(&self, filter: PackFilter) -> Result<Vec<pack::Model>> {
    let mut query = pack::Entity::find();

    if let Some(age) = filter.age {
      query = query.filter(pack::Column::Age.eq(age));
    }
    let title = filter.title.as_deref().map(str::trim).unwrap_or_default();
    if !title.is_empty() {
      let title_lower = Func::lower(Expr::col(pack::Column::Title));
      let pattern = format!("%{}%", title.to_lowercase());
      query = query.filter(Expr::expr(title_lower).like(pattern));
    }

    Ok(query.order_by_asc(pack::Column::Title).all(self.db).await?)
  }

  pub async fn public(&self) -> Result<Vec<pack::Model>> {
    let packs = pack::Entity::find()
      .filter(pack::Column::Public.eq(true))
      .order_by_asc(pack::Column::Title)
      .all(self.db)
      .await?;
    Ok(packs)
  }

  pub async fn add_book(&self, pack_id: i32, book_id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    let pack = pack::Entity::find_by_id(pack_id)
      .one(&txn)
      .await?
      .ok_or(Error::PackNotFound)?;
    book::Entity::find_by_id(book_id)
      .one(&txn)
      .await?
      .ok_or(Error::BookNotFound)?;

    let linked =
      book_pack::Entity::find_by_id((pack_id, book_id)).one(&txn).await?;
    if linked.is_some() {
      return Err(Error::InvalidArgs("Book is already in this pack".into()));
    }

    book_pack::ActiveModel { pack_id: Set(pack_id), book_id: Set(book_id) }
      .insert(&txn)
      .await?;

    let count = pack.book_number;
    pack::ActiveModel { book_number: Set(count + 1), ..pack.into() }
      .update(&txn)
      .await?;

    txn.commit().await?;
    Ok(())
  }

  pub async fn remove_book(&self, pack_id: i32, book_id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    let pack = pack::Entity::find_by_id(pack_id)
      .one(&txn)
      .await?
      .ok_or(Error::PackNotFound)?;

    let removed = book_pack::Entity::delete_by_id((pack_id, book_id))
      .exec(&txn)
      .await?
      .rows_affected;
    if removed == 0 {
      return Err(Error::NotInPack);
    }

    let count = pack.book_number;
    pack::ActiveModel { book_number: Set((count - 1).max(0)), ..pack.into() }
      .update(&txn)
      .await?;

    txn.commit().await?;
    Ok(())
  }

  pub async fn books(&self, pack_id: i32) -> Result<Vec<book::Model>> {
    self.get(pack_id).await?;

    let ids: Vec<i32> = book_pack::Entity::find()
      .filter(book_pack::Column::PackId.eq(pack_id))
      .all(self.db)
      .await?
      .into_iter()
      .map(|link| link.book_id)
      .collect();

    let books = book::Entity::find()
      .filter(book::Column::Id.is_in(ids))
      .order_by_asc(book::Column::Title)
      .all(self.db)
      .await?;
    Ok(books)
  }

  pub async fn set_invoice_product(
    &self,
    id: i32,
    product_id: String,
  ) -> Result<pack::Model> {
    let pack = self.get(id).await?;
    let pack = pack::ActiveModel {
      invoice_product_id: Set(Some(product_id)),
      ..pack.into()
    }
    .update(self.db)
    .await?;
    Ok(pack)
  }

  /// Drops the pack with its sessions, follows, unlocked books, codes and
  /// book links.
  pub async fn delete(&self, id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    pack::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::PackNotFound)?;

    let sessions: Vec<i32> = session::Entity::find()
      .filter(session::Column::PackId.eq(id))
      .all(&txn)
      .await?
      .into_iter()
      .map(|s| s.id)
      .collect();
    sv::session::purge(&txn, sessions).await?;

    follow_book::Entity::delete_many()
      .filter(follow_book::Column::PackId.eq(id))
      .exec(&txn)
      .await?;
    follow_pack::Entity::delete_many()
      .filter(follow_pack::Column::PackId.eq(id))
      .exec(&txn)
      .await?;
    let codes = code::Entity::delete_many()
      .filter(code::Column::PackId.eq(id))
      .exec(&txn)
      .await?
      .rows_affected;
    book_pack::Entity::delete_many()
      .filter(book_pack::Column::PackId.eq(id))
      .exec(&txn)
      .await?;

    pack::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    info!("Deleted pack #{id} ({codes} codes)");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::follow_session,
    sv::test_utils::{fixtures, test_db},
  };

  #[tokio::test]
  async fn test_create_validation() {
    let db = test_db::setup().await;
    let sv = Pack::new(&db);

    let res = sv
      .create(PackInput { title: Some("  ".into()), ..Default::default() })
      .await;
    assert!(matches!(res, Err(Error::InvalidArgs(_))));

    fixtures::pack(&db, "Classics").await;
    let res = sv
      .create(PackInput {
        title: Some("Classics".into()),
        level: Some("C1".into()),
        ..Default::default()
      })
      .await;
    assert!(matches!(res, Err(Error::Conflict(_))));
  }

  #[tokio::test]
  async fn test_book_number_tracks_links() {
    let db = test_db::setup().await;
    let sv = Pack::new(&db);

    let pack = fixtures::pack(&db, "Sci-fi").await;
    let dune = fixtures::book(&db, "Dune").await;
    let messiah = fixtures::book(&db, "Dune Messiah").await;

    sv.add_book(pack.id, dune.id).await.unwrap();
    sv.add_book(pack.id, messiah.id).await.unwrap();
    assert!(matches!(
      sv.add_book(pack.id, dune.id).await,
      Err(Error::InvalidArgs(_))
    ));
    assert_eq!(sv.get(pack.id).await.unwrap().book_number, 2);

    sv.remove_book(pack.id, dune.id).await.unwrap();
    assert!(matches!(
      sv.remove_book(pack.id, dune.id).await,
      Err(Error::NotInPack)
    ));

    let books = sv.books(pack.id).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, messiah.id);
    assert_eq!(sv.get(pack.id).await.unwrap().book_number, 1);
  }

  #[tokio::test]
  async fn test_list_filters() {
    let db = test_db::setup().await;
    let sv = Pack::new(&db);

    sv.create(PackInput {
      title: Some("Fairy Tales".into()),
      level: Some("A1".into()),
      age: Some(AgeGroup::Kid),
      ..Default::default()
    })
    .await
    .unwrap();
    sv.create(PackInput {
      title: Some("Noir".into()),
      level: Some("C1".into()),
      age: Some(AgeGroup::Adult),
      public: Some(false),
      ..Default::default()
    })
    .await
    .unwrap();

    let kids = sv
      .list(PackFilter { age: Some(AgeGroup::Kid), ..Default::default() })
      .await
      .unwrap();
    assert_eq!(kids.len(), 1);

    let found = sv
      .list(PackFilter { title: Some("fAIRY".into()), ..Default::default() })
      .await
      .unwrap();
    assert_eq!(found[0].title, "Fairy Tales");

    assert_eq!(sv.public().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_delete_cascades() {
    let db = test_db::setup().await;
    let session = fixtures::session(&db, "Book club", 5).await;
    let reader = fixtures::reader(&db, "alice").await;

    let follow = sv::Follow::new(&db);
    follow.request_pack(reader.id, session.pack_id).await.unwrap();
    follow.set_pack_approval(reader.id, session.pack_id, true).await.unwrap();
    follow.enroll(reader.id, session.id).await.unwrap();
    sv::Code::new(&db, 8).generate(session.pack_id, 3).await.unwrap();

    Pack::new(&db).delete(session.pack_id).await.unwrap();

    assert_eq!(code::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(follow_pack::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(follow_book::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(follow_session::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(book_pack::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(session::Entity::find().count(&db).await.unwrap(), 0);
    let book = book::Entity::find_by_id(session.book_id).one(&db).await;
    assert!(book.unwrap().is_some());
  }
}
