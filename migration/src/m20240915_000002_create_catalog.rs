use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Books::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Books::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Books::Title).string_len(100).not_null())
          .col(ColumnDef::new(Books::Author).string_len(100).not_null())
          .col(ColumnDef::new(Books::Description).string_len(1000).null())
          .col(ColumnDef::new(Books::Img).string_len(300).null())
          .col(ColumnDef::new(Books::ReleaseDate).date().null())
          .col(ColumnDef::new(Books::PageNumber).integer().null())
          .col(ColumnDef::new(Books::Category).string_len(100).null())
          .col(ColumnDef::new(Books::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_books_title_author")
          .table(Books::Table)
          .col(Books::Title)
          .col(Books::Author)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Packs::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Packs::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Packs::Title).string_len(45).not_null().unique_key())
          .col(ColumnDef::new(Packs::Level).string_len(45).not_null())
          .col(ColumnDef::new(Packs::Description).string_len(200).null())
          .col(ColumnDef::new(Packs::Age).string().null())
          .col(ColumnDef::new(Packs::Img).string_len(300).null())
          .col(ColumnDef::new(Packs::Faq).text().null())
          .col(ColumnDef::new(Packs::Duration).integer().null())
          .col(ColumnDef::new(Packs::BookNumber).integer().not_null().default(0))
          .col(ColumnDef::new(Packs::Price).double().not_null().default(0.0))
          .col(ColumnDef::new(Packs::Discount).double().not_null().default(0.0))
          .col(ColumnDef::new(Packs::Public).boolean().not_null().default(true))
          .col(ColumnDef::new(Packs::InvoiceProductId).string().null())
          .col(ColumnDef::new(Packs::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(BookPacks::Table)
          .if_not_exists()
          .col(ColumnDef::new(BookPacks::PackId).integer().not_null())
          .col(ColumnDef::new(BookPacks::BookId).integer().not_null())
          .primary_key(
            Index::create().col(BookPacks::PackId).col(BookPacks::BookId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_book_packs_pack")
              .from(BookPacks::Table, BookPacks::PackId)
              .to(Packs::Table, Packs::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_book_packs_book")
              .from(BookPacks::Table, BookPacks::BookId)
              .to(Books::Table, Books::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(BookPacks::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Packs::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Books::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Books {
  Table,
  Id,
  Title,
  Author,
  Description,
  Img,
  ReleaseDate,
  PageNumber,
  Category,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum Packs {
  Table,
  Id,
  Title,
  Level,
  Description,
  Age,
  Img,
  Faq,
  Duration,
  BookNumber,
  Price,
  Discount,
  Public,
  InvoiceProductId,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum BookPacks {
  Table,
  PackId,
  BookId,
}
