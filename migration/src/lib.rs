pub use sea_orm_migration::prelude::*;

mod m20240915_000001_create_users;
mod m20240915_000002_create_catalog;
mod m20240915_000003_create_sessions;
mod m20240915_000004_create_follows;
mod m20240915_000005_create_codes;
mod m20240915_000006_create_extras;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20240915_000001_create_users::Migration),
      Box::new(m20240915_000002_create_catalog::Migration),
      Box::new(m20240915_000003_create_sessions::Migration),
      Box::new(m20240915_000004_create_follows::Migration),
      Box::new(m20240915_000005_create_codes::Migration),
      Box::new(m20240915_000006_create_extras::Migration),
    ]
  }
}
